// Herald Modules - built-in commands
// Each module registers its handlers through herald_core::application::Module

pub mod admin;
pub mod help;
pub mod load;
pub mod stat;

pub use admin::AdminModule;
pub use help::HelpModule;
pub use load::LoadModule;
pub use stat::StatModule;

use herald_core::application::Module;

/// Modules enabled by default, in initialization order
pub fn default_modules() -> Vec<Box<dyn Module>> {
    vec![
        Box::new(StatModule::new()),
        Box::new(HelpModule),
        Box::new(LoadModule::new()),
        Box::new(AdminModule),
    ]
}


#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::application::build_registry;
    use herald_core::domain::DispatchConfig;

    #[test]
    fn test_default_modules_register_without_conflict() {
        let registry = build_registry(default_modules(), &DispatchConfig::default()).unwrap();
        for name in ["stat", "help", "load", "quit", "restart"] {
            assert!(registry.contains(name), "{name} missing");
        }
        assert!(registry.resolve("load").is_long_running());
        assert!(registry.resolve("quit").requires_privilege());
    }
}
