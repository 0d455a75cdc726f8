pub mod activity_logs;
pub mod aspirations;
pub mod chat_messages;
pub mod discounts;
pub mod events;
pub mod forum_comments;
pub mod forums;
pub mod media;
pub mod news;
pub mod notifications;
pub mod poll_options;
pub mod polls;
pub mod product_categories;
pub mod products;
pub mod social_media;
pub mod transactions;
pub mod users;
pub mod vouchers;

pub use activity_logs::Entity as ActivityLogs;
pub use aspirations::Entity as Aspirations;
pub use chat_messages::Entity as ChatMessages;
pub use discounts::Entity as Discounts;
pub use events::Entity as Events;
pub use forum_comments::Entity as ForumComments;
pub use forums::Entity as Forums;
pub use media::Entity as Media;
pub use news::Entity as News;
pub use notifications::Entity as Notifications;
pub use poll_options::Entity as PollOptions;
pub use polls::Entity as Polls;
pub use product_categories::Entity as ProductCategories;
pub use products::Entity as Products;
pub use social_media::Entity as SocialMedia;
pub use transactions::Entity as Transactions;
pub use users::Entity as Users;
pub use vouchers::Entity as Vouchers;
