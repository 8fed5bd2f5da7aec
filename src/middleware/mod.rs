mod auth;

pub use auth::{
    auth_middleware, require_active, require_organizer, require_superuser, require_verified,
    ActiveUser, CurrentUser, OrganizerUser, SuperUser,
};
