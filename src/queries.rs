// GraphQL documents sent to the platform. Each command pairs one of these
// with its variables; field lists follow what the web app requests.

/// Everything needed to enumerate context candidates.
pub const CONTEXT_CANDIDATES: &str = r#"
query contextCandidates {
  me {
    availablePreschools {
      id
      name
      years { edges { node { id displayName isOpen } } }
    }
    children { id name surname }
  }
}
"#;

pub const ME: &str = r#"
query me {
  me {
    id
    firstName
    lastName
    fullName
    email
    phone
    userType
    userPosition
    unreadNotificationsCount
    unreadMessagesCount
    availablePreschools { id name address city phone email }
    children { id name surname avatar group { id name } }
  }
}
"#;

pub const COLORS: &str = r#"
query colors {
  me {
    availablePreschools {
      id
      usercolorSet {
        headerColor
        backgroundColor
        accentColor
        highlightColor
        inputColor
      }
    }
  }
}
"#;

pub const UNREAD_COUNTS: &str = r#"
query unreadCounts {
  me {
    unreadNotificationsCount
    unreadMessagesCount
  }
}
"#;

pub const ACTIVE_CHILD_SUMMARY: &str = r#"
query activeChild {
  activeChild {
    id
    name
    surname
    avatar
    status
    preschool { id name }
    group { id name }
    preschoolAgreementsAccepted
    parents {
      edges {
        node {
          id
          firstName
          lastName
          phone
          email
          hasAppAccess
          canPickupChild
          isLegalGuardian
        }
      }
    }
  }
}
"#;

pub const ACTIVE_CHILD_DETAIL: &str = r#"
query activeChild($dateFrom: Date!, $dateTo: Date!) {
  activeChild {
    id
    name
    surname
    birthdate
    status
    balance
    mainAccountBalance
    overpayAmount
    currentInterest
    galleryAccess
    dietCategory { id name }
    exclusions { id name }
    preschool { id name }
    group { id name }
    additionalAccounts { accountName balanceForChild }
    alerts { field text }
    meals {
      edges {
        node {
          id
          enabled
          startDate
          endDate
          isActive
          meal { id name }
        }
      }
    }
    parents {
      edges {
        node {
          id
          firstName
          lastName
          phone
          email
          canPickupChild
          isLegalGuardian
        }
      }
    }
    dailyActivities(dateFrom: $dateFrom, dateTo: $dateTo) {
      edges {
        node {
          id
          date
          breakfast
          mainDish
          dinner
          tea
          napTime
          poo
          observation
          outdoorTime
          absence
          dropOffTime
          pickUpTime
          pickedUpBy { id firstName lastName }
          backpackItems { id description expirationDate isPacked }
        }
      }
    }
  }
}
"#;

pub const ANNOUNCEMENTS: &str = r#"
query announcements($first: Int, $after: String, $status: AnnouncementStatus, $phrase: String) {
  announcements(first: $first, after: $after, status: $status, phrase: $phrase) {
    pageInfo { startCursor endCursor hasNextPage }
    edges {
      node {
        id
        title
        text
        expirationDate
        created
        read
        groups { edges { node { id name } } }
        createdBy { id fullName userPosition }
        attachmentUrls { id fileName url }
      }
    }
  }
}
"#;

pub const NOTIFICATIONS: &str = r#"
query notifications($first: Int, $after: String, $pending: Boolean) {
  notifications(first: $first, after: $after, pending: $pending) {
    pageInfo { startCursor endCursor hasNextPage }
    edges {
      node {
        id
        title
        text
        target
        created
        isRead
        notifyOn
        relatedId
        type
        isPostponed
        notification { id }
        data
      }
    }
  }
}
"#;

pub const SET_NOTIFICATION_READ: &str = r#"
mutation setNotificationRead($notificationId: ID!) {
  setNotificationRead(notificationId: $notificationId) {
    success
  }
}
"#;

pub const USER_NOTIFICATION_PREFERENCES: &str = r#"
query userNotificationPreferences {
  userNotificationPreferences {
    type
    name
    enabled
  }
}
"#;

pub const SET_USER_NOTIFICATION_PREFERENCES: &str = r#"
mutation setUserNotificationPreferences($preferences: [NotificationPreferenceInput!]!) {
  setUserNotificationPreferences(preferences: $preferences) {
    success
  }
}
"#;

pub const MONTHLY_BILLS: &str = r#"
query monthlyBills(
  $child: ID
  $isPaid: Boolean
  $year: String = ""
  $first: Int
  $after: String
) {
  monthlyBills(child: $child, isPaid: $isPaid, year: $year, first: $first, after: $after) {
    pageInfo { endCursor hasNextPage }
    totalBalance
    edges {
      node {
        id
        child { id name surname }
        amount
        balance
        interestAmount
        isAccepted
        fullAmount
        paidAmount
        paymentDueTo
        billNumber
        billingPeriod { id month { id startDate } }
      }
    }
  }
}
"#;

pub const PAYMENTS: &str = r#"
query payments(
  $first: Int
  $after: String
  $dateFrom: Date
  $dateTo: Date
  $child: ID
  $type: String
  $isBooked: Boolean
) {
  payments(
    first: $first
    after: $after
    dateFrom: $dateFrom
    dateTo: $dateTo
    child: $child
    type: $type
    isBooked: $isBooked
  ) {
    edges {
      node {
        id
        title
        amount
        paymentDate
        type
        isBooked
        child { id name surname }
      }
    }
    pageInfo { endCursor hasNextPage }
  }
}
"#;

pub const PAYMENTS_SUMMARY: &str = r#"
query paymentsSummary(
  $search: String
  $groupsIds: [ID]
  $balanceGte: Decimal
  $balanceLte: Decimal
  $paidMonthlyBillsCountGte: Int
  $paidMonthlyBillsCountLte: Int
  $childrenFirst: Int = 50
  $childrenAfter: String
) {
  paymentsSummary(
    search: $search
    groupsIds: $groupsIds
    balanceGte: $balanceGte
    balanceLte: $balanceLte
    paidMonthlyBillsCountGte: $paidMonthlyBillsCountGte
    paidMonthlyBillsCountLte: $paidMonthlyBillsCountLte
  ) {
    fullBalance
    children(first: $childrenFirst, after: $childrenAfter) {
      edges {
        node {
          id
          name
          surname
          balance
          paidAmount
          amount
          paidMonthlyBillsCount
        }
      }
      pageInfo { endCursor hasNextPage }
    }
  }
}
"#;

pub const PAYMENT_ORDERS: &str = r#"
query paymentOrders($first: Int, $after: String, $before: String, $offset: Int) {
  paymentOrders(first: $first, after: $after, before: $before, offset: $offset) {
    pageInfo { endCursor hasNextPage }
    edges {
      node {
        id
        created
        amount
        bluemediaOrderId
        bluemediaPaymentStatus
        bookingDate
      }
    }
  }
}
"#;

pub const GALLERIES: &str = r#"
query galleries(
  $groupId: String
  $first: Int
  $after: String
  $search: String
  $order: String
  $imagesFirst: Int = 9
) {
  galleries(group: $groupId, first: $first, after: $after, phrase: $search, order: $order) {
    edges {
      node {
        id
        name
        created
        description
        imagesCount
        paginatedImages(first: $imagesFirst) {
          edges { node { id imageUrl imageUrlFull } }
        }
        videos { id videoUrl }
        comments { id content created addedBy { id fullName } }
        meLike
        likesCount
      }
    }
    pageInfo { hasNextPage endCursor }
  }
}
"#;

pub const SET_GALLERY_LIKE: &str = r#"
mutation setGalleryLike($galleryId: ID!) {
  setGalleryLike(galleryId: $galleryId) {
    success
    isLiked
  }
}
"#;

pub const CREATE_GALLERY_COMMENT: &str = r#"
mutation createGalleryComment($galleryId: ID!, $content: String!) {
  createGalleryComment(input: { gallery: $galleryId, content: $content }) {
    errors
    galleryComment { id content }
  }
}
"#;

pub const CHAT_THREADS: &str = r#"
query threads(
  $first: Int
  $after: String
  $type: String
  $child: ID
  $preschool: ID
  $search: String
) {
  threads(
    first: $first
    after: $after
    type: $type
    child: $child
    preschool: $preschool
    search: $search
  ) {
    pageInfo { endCursor hasNextPage }
    edges {
      node {
        id
        name
        type
        modified
        lastMessage
        isRead
        recipients { id fullName }
        child { id name surname }
      }
    }
  }
}
"#;

pub const CHAT_MESSAGES: &str = r#"
query thread($id: ID!, $first: Int, $after: String) {
  thread(id: $id) {
    id
    name
    type
    modified
    lastMessage
    recipients { id fullName }
    messages(first: $first, after: $after) {
      pageInfo { endCursor hasNextPage }
      edges {
        node {
          id
          text
          created
          read
          sender { id fullName }
        }
      }
    }
  }
}
"#;

pub const USERS_FOR_CHAT: &str = r#"
query usersForChat($userTypes: [String]) {
  usersForChat(userTypes: $userTypes) {
    id
    chatDisplayName
    userType
    userPosition
    chatUserPosition
    roleName
    firstName
    lastName
  }
}
"#;

pub const GROUPS_FOR_CHAT: &str = r#"
query groupsForChat($search: String) {
  groupsForChat(search: $search) {
    id
    name
    children {
      id
      fullName
      parents { id chatDisplayName positionName }
    }
  }
}
"#;

pub const CREATE_THREAD: &str = r#"
mutation createThread($input: CreateThreadInput!) {
  createThread(input: $input) {
    success
    error
    id
  }
}
"#;

pub const CALENDAR: &str = r#"
query calendar(
  $groupsIds: [ID]
  $dateFrom: Date!
  $dateTo: Date!
  $activityTypes: [Int]
  $showCanceledActivities: Boolean
  $forSchedule: Boolean
  $activityId: ID
) {
  calendar(
    groupsIds: $groupsIds
    dateFrom: $dateFrom
    dateTo: $dateTo
    activityTypes: $activityTypes
    showCanceledActivities: $showCanceledActivities
    forSchedule: $forSchedule
    activityId: $activityId
  ) {
    title
    startDate
    endDate
    id
    allDay
    type
    color
    groupsNames
    isCanceled
    effectiveOnlineUrl
    absenceReportedBy { id fullName }
    absenceReportedOnTime
    mealsModifiedDatetime
    lesson { id name note activityType }
  }
}
"#;

pub const QUICK_CALENDAR: &str = r#"
query quickCalendar($groupsIds: [ID], $dateFrom: Date!, $dateTo: Date!) {
  quickCalendar(groupsIds: $groupsIds, dateFrom: $dateFrom, dateTo: $dateTo) {
    date
    hasEvents
    hasNewEvents
    holiday
    absent
    mealsModified
  }
}
"#;

pub const SCHEDULE: &str = r#"
query schedule($group: ID!) {
  schedule(group: $group) {
    id
    title
    groupsNames
    startDate
    endDate
    allDay
    type
    color
  }
}
"#;

pub const CURRENT_DIET: &str = r#"
query currentDietForChild {
  currentDietForChild {
    id
    body
    category { id }
    attachments { edges { node { order id fileUrl } } }
  }
}
"#;

pub const ADDITIONAL_ACTIVITY_OBSERVATIONS: &str = r#"
query additionalActivityObservations($childId: ID!, $id: ID) {
  additionalActivities(children: [$childId]) {
    edges {
      node {
        id
        name
        observations(child: $childId) { edges { node { id public } } }
      }
    }
  }
  child(id: $childId) {
    additionalActivityObservations(additionalActivity: $id) {
      edges {
        node {
          id
          public
          additionalActivity { id name }
        }
      }
    }
  }
}
"#;

pub const APPLICATIONS: &str = r#"
query applications($phrase: String, $status: String) {
  applications(phrase: $phrase, status: $status) {
    edges {
      node {
        id
        created
        status
        commentDirector
        applicationForm {
          id
          name
          status
          applicationSubmissionDeadline
          additionalActivity { id name }
        }
      }
    }
  }
}
"#;
