//! Authentication state trait and macro.

use crate::db::UserRepository;
use crate::jwt::JwtConfig;

use super::types::RotationMode;

/// Trait for state types that provide token and user access for authentication.
pub trait HasAuthBackend {
    type Users: UserRepository;

    fn jwt(&self) -> &JwtConfig;
    fn users(&self) -> Self::Users;
    fn rotation_mode(&self) -> RotationMode;
}

/// Macro to implement `HasAuthBackend` for state structs with the standard fields.
///
/// The struct must have these fields:
/// - `jwt: Arc<JwtConfig>`
/// - `db: Database`
/// - `rotation: RotationMode`
///
/// # Example
/// ```ignore
/// use crate::impl_has_auth_backend;
///
/// #[derive(Clone)]
/// pub struct MyState {
///     pub db: Database,
///     pub jwt: Arc<JwtConfig>,
///     pub rotation: RotationMode,
/// }
///
/// impl_has_auth_backend!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_auth_backend {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthBackend for $state_type {
            type Users = $crate::db::UserStore;

            fn jwt(&self) -> &$crate::jwt::JwtConfig {
                &self.jwt
            }
            fn users(&self) -> $crate::db::UserStore {
                self.db.users()
            }
            fn rotation_mode(&self) -> $crate::auth::RotationMode {
                self.rotation
            }
        }
    };
}
