//! Type-keyed registry of in-process clients.
//!
//! A provider module registers an `Arc<T>` once during `init`; consumers fetch it by
//! the interface type, usually a trait object: `hub.get::<dyn identity::IdentityApi>()`.
//! Shared process services (the token codec) are registered the same way by the binary.
//!
//! Keys are `type_name::<T>()`; values are `Arc<T>` boxed as `dyn Any`.
//! Re-registering replaces the entry; `Arc`s already handed out stay valid.

use parking_lot::RwLock;
use std::{any::Any, collections::HashMap, fmt, sync::Arc};

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct TypeKey(&'static str);

impl TypeKey {
    #[inline]
    fn of<T: ?Sized + 'static>() -> Self {
        TypeKey(std::any::type_name::<T>())
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientHubError {
    #[error("client not found: type={type_key:?}")]
    NotFound { type_key: TypeKey },

    #[error("type mismatch in hub for type={type_key:?}")]
    TypeMismatch { type_key: TypeKey },
}

type Boxed = Box<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct ClientHub {
    map: RwLock<HashMap<TypeKey, Boxed>>,
}

impl ClientHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `client` under the interface type `T`.
    pub fn register<T>(&self, client: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        tracing::debug!(type_key = ?key, "client registered");
        self.map.write().insert(key, Box::new(client));
    }

    pub fn get<T>(&self) -> Result<Arc<T>, ClientHubError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_key = TypeKey::of::<T>();
        let map = self.map.read();

        let Some(boxed) = map.get(&type_key) else {
            return Err(ClientHubError::NotFound { type_key });
        };
        match boxed.downcast_ref::<Arc<T>>() {
            Some(client) => Ok(client.clone()),
            None => Err(ClientHubError::TypeMismatch { type_key }),
        }
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}
