//! GraphQL documents sent to the backends.
//!
//! Every user-supplied value travels as a variable.

const USER_FIELDS: &str = "id username email name isAnonymous isVerified";

/// Field selection shared by the session-issuing mutations.
fn session_selection() -> String {
    format!("token refreshToken user {{ {USER_FIELDS} }}")
}

pub(crate) fn me() -> String {
    format!("query Me {{ me {{ {USER_FIELDS} }} }}")
}

pub(crate) fn login() -> String {
    format!(
        "mutation Login($emailOrUsername: String!, $password: String!) {{ \
         login(input: {{ emailOrUsername: $emailOrUsername, password: $password }}) {{ {} }} }}",
        session_selection()
    )
}

pub(crate) fn register() -> String {
    format!(
        "mutation Register($email: String!, $username: String!, $password: String!, $name: String) {{ \
         register(input: {{ email: $email, username: $username, password: $password, name: $name }}) {{ {} }} }}",
        session_selection()
    )
}

pub(crate) fn anonymous_login() -> String {
    format!(
        "mutation AnonymousLogin($nickname: String, $avatarId: Int) {{ \
         anonymousLogin(nickname: $nickname, avatarId: $avatarId) {{ {} }} }}",
        session_selection()
    )
}

pub(crate) const CREATE_MOOD: &str = "mutation CreateMood($input: CreateMoodInput!) { \
    createMood(input: $input) { id userId value score note isPublic createdAt } }";

pub(crate) const MOOD_STREAK: &str = "query MoodStreak($userId: ID!) { \
    moodStreak(userId: $userId) { currentStreak longestStreak lastRecordedAt } }";

pub(crate) const MOOD_HISTORY: &str = "query MoodHistory($userId: ID!, $period: String) { \
    moodHistory(userId: $userId, period: $period) { \
      days { date value score note } \
      summary { averageScore moodFrequency { mood count percentage } startDate endDate } } }";

pub(crate) const MOOD_ANALYTICS: &str = "query MoodAnalytics($userId: ID!, $timeRange: Int, $includeCorrelations: Boolean) { \
    moodAnalytics(userId: $userId, timeRange: $timeRange, includeCorrelations: $includeCorrelations) { \
      statistics { totalEntries uniqueMoods currentStreak longestStreak averageScore moodVariability dominantMood improvementTrend } \
      metrics { moodFrequency moodByDayOfWeek moodByTimeOfDay } \
      insights { id type title description priority isRead } \
      recommendations { type title description priority } } }";

pub(crate) const MOOD_INSIGHTS: &str = "query MoodInsights($userId: ID!) { \
    moodInsights(userId: $userId) { id type title description data priority isRead createdAt } }";

pub(crate) const COMMUNITY_MOODS: &str = "query CommunityMoods($limit: Int, $offset: Int) { \
    communityMoods(limit: $limit, offset: $offset) { \
      moods { id userId value score note isPublic createdAt } totalCount hasMore } }";

const SOCIAL_USER_FIELDS: &str = "id userId displayName isFollowing isFollowedBy isFriend";

pub(crate) fn user_profile() -> String {
    format!(
        "query UserProfile($userId: ID!) {{ userProfile(userId: $userId) {{ \
         {SOCIAL_USER_FIELDS} bio location website profileVisibility moodVisibility \
         stats {{ followingCount followersCount hugsGiven hugsReceived moodEntries currentStreak }} }} }}"
    )
}

/// `following` or `followers` list query.
pub(crate) fn follow_list(operation: &str) -> String {
    format!(
        "query FollowList($userId: ID!, $limit: Int, $offset: Int) {{ \
         {operation}(userId: $userId, limit: $limit, offset: $offset) {{ \
         users {{ {SOCIAL_USER_FIELDS} }} totalCount hasMore }} }}"
    )
}

/// `followUser` or `unfollowUser` mutation.
pub(crate) fn follow_mutation(operation: &str) -> String {
    format!(
        "mutation Follow($userId: ID!) {{ {operation}(userId: $userId) {{ \
         success user {{ {SOCIAL_USER_FIELDS} }} }} }}"
    )
}

const PERSON: &str = "id name username avatar";

pub(crate) fn send_hug() -> String {
    format!(
        "mutation SendHug($input: SendHugInput!) {{ sendHug(input: $input) {{ \
         id sender {{ {PERSON} }} recipient {{ {PERSON} }} hugType message mediaUrl createdAt }} }}"
    )
}

pub(crate) fn request_hug() -> String {
    format!(
        "mutation RequestHug($input: RequestHugInput!) {{ requestHug(input: $input) {{ \
         id requester {{ {PERSON} }} recipient {{ {PERSON} }} message isPublic status expiresAt createdAt }} }}"
    )
}

pub(crate) fn create_group_hug() -> String {
    format!(
        "mutation CreateGroupHug($input: CreateGroupHugInput!) {{ createGroupHug(input: $input) {{ \
         id creator {{ {PERSON} }} title message hugType maxParticipants isPublic expiresAt \
         participantCount hasJoined createdAt }} }}"
    )
}

pub(crate) fn hugs() -> String {
    format!(
        "query Hugs($userId: ID!, $type: String!, $limit: Int, $offset: Int) {{ \
         hugs(userId: $userId, type: $type, limit: $limit, offset: $offset) {{ \
         hugs {{ id sender {{ {PERSON} }} recipient {{ {PERSON} }} hugType message isRead createdAt }} \
         totalCount hasMore }} }}"
    )
}

pub(crate) fn hug_requests() -> String {
    format!(
        "query HugRequests($userId: ID!, $status: String, $limit: Int, $offset: Int) {{ \
         hugRequests(userId: $userId, status: $status, limit: $limit, offset: $offset) {{ \
         requests {{ id requester {{ {PERSON} }} recipient {{ {PERSON} }} message isPublic status expiresAt createdAt }} \
         totalCount hasMore }} }}"
    )
}

pub(crate) fn group_hugs() -> String {
    format!(
        "query GroupHugs($userId: ID!, $status: String, $limit: Int, $offset: Int) {{ \
         groupHugs(userId: $userId, status: $status, limit: $limit, offset: $offset) {{ \
         groups {{ id creator {{ {PERSON} }} title message hugType participantCount hasJoined expiresAt createdAt }} \
         totalCount hasMore }} }}"
    )
}

pub(crate) fn media_hugs() -> String {
    format!(
        "query MediaHugs($category: String, $mood: String, $limit: Int, $offset: Int) {{ \
         mediaHugs(category: $category, mood: $mood, limit: $limit, offset: $offset) {{ \
         mediaHugs {{ id title description creator {{ {PERSON} }} mediaType mediaUrl thumbnailUrl \
         category tags moodTags viewCount likeCount isFavorite createdAt }} totalCount hasMore }} }}"
    )
}

pub(crate) const SHARE_TO_SOCIAL: &str = "mutation ShareToSocial($input: ShareToSocialInput!) { \
    shareToSocial(input: $input) { success message url } }";
