//! Server assembly.
//!
//! ```text
//! Server::new(config)          engine + built-ins + superuser from config
//!   ├─ register_operation()    application operations
//!   ├─ register_type()         extra documented types
//!   └─ start()  ──▶ Arc<Dispatcher>
//!                   (registration closed from here on)
//! ```

use crate::builtin;
use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::operation::OperationDefinition;
use crate::registry::{RegistryBuilder, RegistryError};
use rpcc_auth::guards::IdentityListGuard;
use rpcc_auth::DecisionEngine;
use rpcc_schema::{StandardTypes, TypeDescriptor};
use std::sync::Arc;

/// Owns registration until [`start`](Self::start), then the dispatcher.
///
/// # Example
///
/// ```
/// use rpcc_runtime::config::ServerConfig;
/// use rpcc_runtime::Server;
/// use serde_json::json;
///
/// let mut server = Server::new(ServerConfig::default()).unwrap();
/// let dispatcher = server.start().unwrap();
///
/// let response = dispatcher.invoke("server_ping", &[], dispatcher.context(0));
/// assert_eq!(response.result(), Some(&json!(null)));
/// ```
#[derive(Debug)]
pub struct Server {
    config: Arc<ServerConfig>,
    engine: Arc<DecisionEngine>,
    standard: StandardTypes,
    builder: Option<RegistryBuilder>,
    dispatcher: Option<Arc<Dispatcher>>,
}

impl Server {
    /// Creates a server with the built-in operations registered.
    ///
    /// A non-empty `superusers` list replaces the server-wide superuser
    /// guard with an identity list over those users.
    ///
    /// # Errors
    ///
    /// Fails only if the built-in definitions are inconsistent.
    pub fn new(config: ServerConfig) -> Result<Self, RegistryError> {
        let engine = Arc::new(DecisionEngine::new());
        if !config.superusers.is_empty() {
            let superusers = engine.register(IdentityListGuard::new(
                "configured-superusers",
                config.superusers.iter().cloned(),
            ));
            engine.set_superuser_guard(superusers);
        }

        let standard = StandardTypes::new();
        let mut builder = RegistryBuilder::new();
        builtin::register(&mut builder, &standard)?;

        Ok(Self {
            config: Arc::new(config),
            engine,
            standard,
            builder: Some(builder),
            dispatcher: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Arc<ServerConfig> {
        &self.config
    }

    /// The decision engine, for registering guards.
    #[must_use]
    pub fn engine(&self) -> &Arc<DecisionEngine> {
        &self.engine
    }

    /// Shared scalar descriptors, for building operation signatures.
    #[must_use]
    pub fn types(&self) -> &StandardTypes {
        &self.standard
    }

    /// # Errors
    ///
    /// [`RegistryError::RegistrationClosed`] after [`start`](Self::start),
    /// otherwise as [`RegistryBuilder::register_operation`].
    pub fn register_operation(&mut self, def: OperationDefinition) -> Result<(), RegistryError> {
        self.builder
            .as_mut()
            .ok_or(RegistryError::RegistrationClosed)?
            .register_operation(def)
    }

    /// # Errors
    ///
    /// [`RegistryError::RegistrationClosed`] after [`start`](Self::start).
    pub fn register_type(&mut self, ty: Arc<TypeDescriptor>) -> Result<(), RegistryError> {
        self.builder
            .as_mut()
            .ok_or(RegistryError::RegistrationClosed)?
            .register_type(ty);
        Ok(())
    }

    /// Freezes the registry and returns the dispatcher.
    ///
    /// # Errors
    ///
    /// [`RegistryError::RegistrationClosed`] if already started, or any
    /// error from [`RegistryBuilder::build`].
    pub fn start(&mut self) -> Result<Arc<Dispatcher>, RegistryError> {
        let builder = self.builder.take().ok_or(RegistryError::RegistrationClosed)?;
        let registry = Arc::new(builder.build()?);
        tracing::info!(
            service = %self.config.service_name,
            max_version = registry.max_version(),
            "server started"
        );
        let dispatcher = Arc::new(Dispatcher::new(
            registry,
            Arc::clone(&self.engine),
            Arc::clone(&self.config),
        ));
        self.dispatcher = Some(Arc::clone(&dispatcher));
        Ok(dispatcher)
    }

    /// The dispatcher, once started.
    #[must_use]
    pub fn dispatcher(&self) -> Option<&Arc<Dispatcher>> {
        self.dispatcher.as_ref()
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.builder.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcc_auth::{CallContext, Outcome};
    use rpcc_types::{Principal, Value};

    #[test]
    fn registration_closes_at_start() {
        let mut server = Server::new(ServerConfig::default()).unwrap();
        assert!(!server.is_started());
        server.start().unwrap();
        assert!(server.is_started());
        assert!(server.dispatcher().is_some());

        let null = Arc::clone(&server.types().null);
        let late =
            OperationDefinition::new("late", null, |_: &CallContext| -> anyhow::Result<Value> {
                Ok(Value::Null)
            });
        assert!(matches!(
            server.register_operation(late),
            Err(RegistryError::RegistrationClosed)
        ));
        assert!(matches!(server.start(), Err(RegistryError::RegistrationClosed)));
    }

    #[test]
    fn configured_superusers_replace_never_allow() {
        let config = ServerConfig {
            superusers: vec!["root".into()],
            ..ServerConfig::default()
        };
        let server = Server::new(config).unwrap();
        let engine = server.engine();
        let su = engine.superuser();

        let as_user = |name: &str| {
            CallContext::new(Arc::clone(engine), 0).with_principal(Principal::user(name))
        };
        let root = as_user("root");
        assert_eq!(engine.decide(&su, &root, &root).outcome, Outcome::Granted);

        let alice = as_user("alice");
        assert_ne!(engine.decide(&su, &alice, &alice).outcome, Outcome::Granted);
    }

    #[test]
    fn default_superuser_never_grants() {
        let server = Server::new(ServerConfig::default()).unwrap();
        let engine = server.engine();
        let root = CallContext::new(Arc::clone(engine), 0).with_principal(Principal::user("root"));
        let su = engine.superuser();
        assert_eq!(engine.decide(&su, &root, &root).outcome, Outcome::Denied);
    }
}
