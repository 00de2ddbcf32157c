pub mod knowledge_base;

pub use knowledge_base::{AddressKnowledgeBase, AddressLabel, HackerInfo, LabelKind};
