use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{ChangePasswordRequest, LoginRequest, LoginResponse, UpdateProfileRequest},
        transactions::{CreateTransactionRequest, TransactionItem, UpdateTransactionRequest},
        vouchers::{CreateVoucherRequest, UpdateVoucherRequest},
    },
    response::Ack,
    routes::{
        activity, aspirations, auth, categories, chat, dashboard, discounts, events, forum,
        health, media, news, notifications, params, polls, products, social_media, transactions,
        users, vouchers,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::me,
        auth::update_profile,
        auth::change_password,
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        transactions::list_transactions,
        transactions::get_transaction,
        transactions::get_transaction_by_number,
        transactions::create_transaction,
        transactions::update_transaction,
        transactions::delete_transaction,
        vouchers::list_vouchers,
        vouchers::get_voucher,
        vouchers::get_voucher_by_code,
        vouchers::create_voucher,
        vouchers::update_voucher,
        vouchers::delete_voucher,
        discounts::list_discounts,
        discounts::list_active_discounts,
        discounts::get_discount,
        discounts::create_discount,
        discounts::update_discount,
        discounts::delete_discount,
        news::list_news,
        news::get_news,
        news::create_news,
        news::update_news,
        news::delete_news,
        forum::list_forums,
        forum::get_forum,
        forum::create_forum,
        forum::update_forum,
        forum::delete_forum,
        forum::like_forum,
        forum::list_comments,
        forum::add_comment,
        forum::update_comment,
        forum::delete_comment,
        polls::list_polls,
        polls::get_poll,
        polls::create_poll,
        polls::update_poll,
        polls::delete_poll,
        events::list_events,
        events::get_event,
        events::create_event,
        events::update_event,
        events::delete_event,
        aspirations::list_aspirations,
        aspirations::get_aspiration,
        aspirations::create_aspiration,
        aspirations::update_status,
        aspirations::delete_aspiration,
        media::list_media,
        media::get_media,
        media::register_media,
        media::delete_media,
        social_media::list_links,
        social_media::get_link,
        social_media::create_link,
        social_media::update_link,
        social_media::delete_link,
        notifications::list_notifications,
        notifications::create_notification,
        notifications::mark_read,
        notifications::delete_notification,
        chat::session_history,
        chat::send_message,
        chat::clear_session,
        activity::list_activity,
        dashboard::summary,
    ),
    components(
        schemas(
            Ack,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            ChangePasswordRequest,
            TransactionItem,
            CreateTransactionRequest,
            UpdateTransactionRequest,
            CreateVoucherRequest,
            UpdateVoucherRequest,
            params::ListParams,
            users::CreateUserRequest,
            users::UpdateUserRequest,
            products::CreateProductRequest,
            products::UpdateProductRequest,
            categories::CreateCategoryRequest,
            categories::UpdateCategoryRequest,
            discounts::CreateDiscountRequest,
            discounts::UpdateDiscountRequest,
            news::CreateNewsRequest,
            news::UpdateNewsRequest,
            forum::CreateForumRequest,
            forum::UpdateForumRequest,
            forum::AddCommentRequest,
            forum::UpdateCommentRequest,
            forum::LikeResponse,
            polls::CreatePollRequest,
            polls::UpdatePollRequest,
            events::CreateEventRequest,
            events::UpdateEventRequest,
            aspirations::CreateAspirationRequest,
            aspirations::UpdateAspirationStatusRequest,
            media::RegisterMediaRequest,
            social_media::CreateLinkRequest,
            social_media::UpdateLinkRequest,
            notifications::CreateNotificationRequest,
            chat::SendMessageRequest,
            dashboard::DashboardSummary,
            health::HealthData,
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication and profile endpoints"),
        (name = "Users", description = "User management"),
        (name = "Products", description = "Product catalogue"),
        (name = "Product Categories", description = "Product category tree"),
        (name = "Transactions", description = "Sales and payments"),
        (name = "Vouchers", description = "Voucher codes and redemption"),
        (name = "Discounts", description = "Storewide discount rules"),
        (name = "News", description = "News articles"),
        (name = "Forums", description = "Forum posts and comments"),
        (name = "Polls", description = "Polls and options"),
        (name = "Events", description = "Event calendar"),
        (name = "Aspirations", description = "User-submitted aspirations and feedback"),
        (name = "Media", description = "Uploaded media registry"),
        (name = "Social Media", description = "Social media links"),
        (name = "Notifications", description = "User notifications"),
        (name = "Chat", description = "Support chat sessions"),
        (name = "Activity", description = "Audit trail"),
        (name = "Dashboard", description = "Aggregate metrics"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
