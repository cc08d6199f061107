//! Data models module
//!
//! This module contains the data structures exchanged with the TonTin backend

pub mod dar;
pub mod member;
pub mod notification;
pub mod page;
pub mod payment;
pub mod round;
pub mod user;

// Re-export commonly used models
pub use dar::{
    CreateDarRequest, Dar, DarDetails, DarLimits, DarMessage, DarPagination, DarStats, DarStatus, GenerateInviteCodeResponse,
    InviteMemberRequest, JoinDarRequest, MemberOrder, OrderMethod, PaymentFrequency, ReportMemberRequest,
    SendMessageRequest, Tour, TourStatus, TrustLevel, TrustThresholds, UpdateDarRequest, UpdateTurnOrderRequest,
    Visibility,
};
pub use member::{Member, MemberRole, MemberStatus, Roster};
pub use notification::{
    Notification, NotificationFilter, NotificationIds, NotificationPreferences, NotificationPreferencesUpdate,
    NotificationPriority, NotificationSummary, NotificationType, RelatedEntity, UnreadCount,
};
pub use page::Page;
pub use payment::{
    ConfirmPaymentResponse, Contribution, ContributionStatus, CreatePaymentIntentRequest, CreatePaymentIntentResponse,
    NextPaymentDue, Payment, PaymentRecordStatus, PaymentStatus, PaymentSummary, PendingPaymentsCheck, Transaction,
    TransactionStatus, TransactionType,
};
pub use round::{Round, RoundStatistics, RoundStatus, PAYMENT_WINDOW_DAYS};
pub use user::{
    AuthResponse, LoginRequest, RefreshTokenRequest, RegisterRequest, TrustPeriod, TrustScore, TrustScoreBreakdown,
    TrustScoreHistory, User,
};
