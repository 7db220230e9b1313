pub mod rules;
mod special;

pub use rules::{
    classify, Classification, ClassificationRule, PathView, RuleEngine, RuleOverride, Tier,
};
