//! User accounts, passwords and cookie based sessions.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod register_user;
mod user;
mod verify;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::post_log_in;
pub use log_out::get_log_out;
pub use middleware::{AuthState, auth_guard};
pub use password::{PASSWORD_HASH_COST, PasswordHash, check_password_strength};
pub use register_user::register_user;
pub use user::{
    User, UserID, create_user, create_user_table, get_user_by_email, get_user_by_id, verify_user,
};
pub use verify::{get_verify_email, verification_hash};
