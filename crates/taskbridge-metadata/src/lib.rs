//! # TaskBridge Metadata
//!
//! Resolves the routing properties and documentation attached to a workflow
//! activity inside its BPMN process definition.
//!
//! Lookups go process instance → definition id → definition XML → parsed
//! index, each step cached. Extraction tries the structural parser first and
//! falls back to a textual scan; when both come up empty the configured
//! default routing target is used, so a missing annotation never blocks
//! dispatch.

mod document_cache;
mod extractor;
mod metadata;
mod parser;
mod source;

pub use document_cache::{DocumentCache, PARSED_DEFINITIONS_CACHE};
pub use extractor::{PatternExtractor, PropertyExtractor, StructuralExtractor};
pub use metadata::{
    DEFINITION_DOCUMENTS_CACHE, DEFINITION_IDS_CACHE, MetadataExtractor, MetadataExtractorConfig,
    ROUTING_PROPERTIES_CACHE, TASK_DOCUMENTATION_CACHE,
};
pub use parser::{ActivityMetadata, ParsedDefinition, parse_definition};
pub use source::{DefinitionSource, EngineClient};
