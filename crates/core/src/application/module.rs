// Feature modules - explicit startup registration
//
// Each feature ships a `Module`. The composition root passes an ordered list to
// `build_registry`, which initializes every module once and merges the handlers
// it returns into a single owned registry.

use crate::application::handler::CommandHandler;
use crate::application::registry::CommandRegistry;
use crate::domain::DispatchConfig;
use crate::error::Result;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Module initialization failure (the module is skipped)
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ModuleError(pub String);

/// A command a module wants registered
pub struct CommandRegistration {
    pub name: String,
    pub handler: Arc<dyn CommandHandler>,
}

impl CommandRegistration {
    pub fn new(name: impl Into<String>, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

/// A unit of functionality contributing one or more commands
pub trait Module: Send {
    fn name(&self) -> &'static str;

    /// Prepare the module and return the commands it provides
    fn init(
        &mut self,
        config: &DispatchConfig,
    ) -> std::result::Result<Vec<CommandRegistration>, ModuleError>;
}

/// Initialize modules in order and build the registry.
///
/// A module whose `init` fails is logged and left out. A command name claimed
/// twice aborts startup.
pub fn build_registry(
    modules: Vec<Box<dyn Module>>,
    config: &DispatchConfig,
) -> Result<CommandRegistry> {
    let mut registry = CommandRegistry::new();
    for mut module in modules {
        let module_name = module.name();
        info!(module = module_name, "Initializing module");
        let registrations = match module.init(config) {
            Ok(registrations) => registrations,
            Err(e) => {
                error!(module = module_name, error = %e, "Module initialization failed, skipping");
                continue;
            }
        };
        for registration in registrations {
            info!(module = module_name, command = %registration.name, "Registering command");
            registry.register(registration.name, registration.handler)?;
        }
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handler::{HandlerContext, HandlerError};
    use crate::application::registry::RegistryError;
    use crate::domain::Event;
    use crate::error::AppError;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl CommandHandler for Noop {
        async fn execute(
            &self,
            _ctx: &HandlerContext,
            _event: &Event,
        ) -> std::result::Result<(), HandlerError> {
            Ok(())
        }
        fn describe(&self) -> &str {
            "noop"
        }
    }

    struct TestModule {
        name: &'static str,
        commands: Vec<&'static str>,
        fail: bool,
    }

    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        fn init(
            &mut self,
            _config: &DispatchConfig,
        ) -> std::result::Result<Vec<CommandRegistration>, ModuleError> {
            if self.fail {
                return Err(ModuleError("boom".to_string()));
            }
            Ok(self
                .commands
                .iter()
                .map(|c| CommandRegistration::new(*c, Arc::new(Noop)))
                .collect())
        }
    }

    fn module(name: &'static str, commands: Vec<&'static str>, fail: bool) -> Box<dyn Module> {
        Box::new(TestModule {
            name,
            commands,
            fail,
        })
    }

    #[test]
    fn test_modules_merged_into_registry() {
        let modules: Vec<Box<dyn Module>> = vec![
            module("a", vec!["one", "two"], false),
            module("b", vec!["three"], false),
        ];
        let registry = build_registry(modules, &DispatchConfig::default()).unwrap();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("three"));
    }

    #[test]
    fn test_failing_module_is_skipped() {
        let modules: Vec<Box<dyn Module>> = vec![
            module("broken", vec!["x"], true),
            module("ok", vec!["y"], false),
        ];
        let registry = build_registry(modules, &DispatchConfig::default()).unwrap();
        assert!(!registry.contains("x"));
        assert!(registry.contains("y"));
    }

    #[test]
    fn test_duplicate_command_across_modules_is_fatal() {
        let modules: Vec<Box<dyn Module>> = vec![
            module("a", vec!["stat"], false),
            module("b", vec!["stat"], false),
        ];
        let Err(err) = build_registry(modules, &DispatchConfig::default()) else {
            panic!("duplicate command accepted");
        };
        assert!(matches!(
            err,
            AppError::Registry(RegistryError::DuplicateCommand(ref name)) if name == "stat"
        ));
    }
}
