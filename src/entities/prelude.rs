pub use super::middlewares::Entity as Middlewares;
pub use super::resource_middlewares::Entity as ResourceMiddlewares;
pub use super::resource_services::Entity as ResourceServices;
pub use super::resources::Entity as Resources;
pub use super::services::Entity as Services;
