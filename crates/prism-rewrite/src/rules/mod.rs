//! The normative rule library. Priorities encode the required ordering:
//! qualifier (100) before function (90) before output (80) before layout
//! (70) before legacy built-ins (60) before type checks (50) before feature
//! rejects (40).

mod feature;
mod fragout;
mod layout;
mod legacy;
mod qualifier;
mod texture;
mod typecheck;

pub use feature::{BlockCompatRule, FeatureRejectRule};
pub use fragout::{FragOutputDowngradeRule, FragOutputUpgradeRule};
pub use layout::LayoutDowngradeRule;
pub use legacy::LegacyBuiltinRule;
pub use qualifier::{StorageDowngradeRule, StorageUpgradeRule};
pub use texture::{TextureDowngradeRule, TextureUpgradeRule};
pub use typecheck::TypeCompatRule;

use crate::rule::RuleRegistry;

pub fn register_defaults(registry: &mut RuleRegistry) {
    registry.register(Box::new(StorageUpgradeRule));
    registry.register(Box::new(StorageDowngradeRule));
    registry.register(Box::new(TextureUpgradeRule));
    registry.register(Box::new(TextureDowngradeRule));
    registry.register(Box::new(FragOutputUpgradeRule));
    registry.register(Box::new(FragOutputDowngradeRule));
    registry.register(Box::new(LayoutDowngradeRule));
    registry.register(Box::new(LegacyBuiltinRule));
    registry.register(Box::new(TypeCompatRule));
    registry.register(Box::new(FeatureRejectRule));
    registry.register(Box::new(BlockCompatRule));
}
