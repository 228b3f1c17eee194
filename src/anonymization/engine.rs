//! Main anonymization engine
//!
//! This module provides the [`AnonymizationEngine`] that ties the recognizer
//! registry, entity resolver, field policy, operator dispatcher and audit log
//! together.
//!
//! # Architecture
//!
//! Everything is fixed when the engine is built:
//! - **Registry**: built-in PII and bias recognizers plus configured and injected ones
//! - **Operator mapping**: chosen by the strategy and checked against every
//!   entity type the registry can emit
//! - **Field policy**: preset plus configured path rules
//! - **Run secrets**: hash salt and encryption keys
//!
//! Each document is then walked once; see [`DocumentWalker`].
//!
//! # Examples
//!
//! ```no_run
//! use bias_anonymizer::anonymization::{AnonymizationConfig, AnonymizationEngine};
//! use serde_json::json;
//!
//! # fn example() -> bias_anonymizer::domain::Result<()> {
//! let engine = AnonymizationEngine::new(AnonymizationConfig::default())?;
//!
//! let result = engine.anonymize(&json!({
//!     "id": "emp-1",
//!     "notes": "Contact john@xyz.com"
//! }))?;
//! println!("Anonymized {} spans", result.detections.len());
//! # Ok(())
//! # }
//! ```

use crate::anonymization::{
    audit::AuditLogger,
    config::AnonymizationConfig,
    models::AnonymizedDocument,
    operators::{HashSalt, KeyRing, OperatorDispatcher, OperatorMapping},
    policy::FieldPolicyTable,
    recognizer::{NlpEntityRecognizer, NlpRecognizer, PatternRule, Recognizer},
    registry::RecognizerRegistry,
    report::{AnalysisReport, BatchReport},
    resolver::EntityResolver,
    walker::{DocumentWalker, WalkMode, WalkOutput},
};
use crate::domain::{AnonymizerError, EntityType, Result};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Main anonymization engine
///
/// # Thread Safety
///
/// The engine is `Send + Sync` and read-only once built; share it across
/// tasks with `Arc`. Registration methods take `&mut self` and are meant to
/// run before the engine is shared.
pub struct AnonymizationEngine {
    config: AnonymizationConfig,
    registry: RecognizerRegistry,
    resolver: EntityResolver,
    dispatcher: OperatorDispatcher,
    mapping: OperatorMapping,
    policy: FieldPolicyTable,
    entity_filter: Option<HashSet<EntityType>>,
    audit_logger: AuditLogger,
}

impl AnonymizationEngine {
    /// Create a new anonymization engine
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - A custom recognizer does not compile
    /// - Some detectable entity type has no operator and there is no `DEFAULT`
    ///   ([`AnonymizerError::OperatorMisconfiguration`])
    /// - An encryption key is malformed
    /// - The audit log directory cannot be created
    pub fn new(config: AnonymizationConfig) -> Result<Self> {
        config.validate()?;

        let mut registry =
            RecognizerRegistry::with_builtins(&config.detection.builtin_selection())?;
        for custom in &config.recognizers {
            registry.register(Arc::new(custom.build(&config.detection)?))?;
        }

        let salt = match &config.secrets.hash_salt {
            Some(secret) => HashSalt::from_secret(secret),
            None => {
                tracing::debug!("No hash salt configured; using a random salt for this run");
                HashSalt::generate()
            }
        };
        let keys = KeyRing::from_base64(&config.secrets.encryption_keys)?;
        let policy = config.field_policy.build()?;

        let audit_logger = if config.audit.enabled {
            AuditLogger::new(
                config.audit.log_path.clone(),
                config.audit.json_format,
                true,
            )
            .map_err(|e| AnonymizerError::Io(format!("{e:#}")))?
        } else {
            AuditLogger::disabled()
        };

        let mapping = build_mapping(&config, &registry, &keys)?;

        tracing::info!(
            recognizers = registry.len(),
            entity_types = registry.entity_types().len(),
            strategy = %config.anonymization.strategy,
            default_policy = %policy.default_policy(),
            "Anonymization engine ready"
        );

        Ok(Self {
            resolver: EntityResolver::new(config.detection.confidence_threshold),
            entity_filter: config.detection.entity_filter(),
            dispatcher: OperatorDispatcher::new(salt, keys),
            config,
            registry,
            mapping,
            policy,
            audit_logger,
        })
    }

    /// Register an injected named-entity recognizer (PERSON and similar types)
    pub fn with_nlp(mut self, nlp: Arc<dyn NlpEntityRecognizer>) -> Result<Self> {
        let recognizer = NlpRecognizer::new(nlp, self.config.detection.language.clone());
        self.register_recognizer(Arc::new(recognizer))?;
        Ok(self)
    }

    /// Add a recognizer
    ///
    /// The operator mapping is rebuilt and must cover the new entity types,
    /// otherwise the registration is rolled back.
    pub fn register_recognizer(&mut self, recognizer: Arc<dyn Recognizer>) -> Result<()> {
        let mut registry = self.registry.clone();
        registry.register(recognizer)?;
        self.commit_registry(registry)
    }

    /// Compile pattern rules into a recognizer and add it
    pub fn register_pattern_rules(
        &mut self,
        id: impl Into<String>,
        rules: Vec<PatternRule>,
    ) -> Result<()> {
        let mut registry = self.registry.clone();
        registry.register_rules(id, rules)?;
        self.commit_registry(registry)
    }

    /// Stop detecting an entity type; returns the number of recognizers affected
    pub fn deregister_recognizer(&mut self, entity_type: &EntityType) -> usize {
        self.registry.deregister(entity_type)
    }

    fn commit_registry(&mut self, registry: RecognizerRegistry) -> Result<()> {
        self.mapping = build_mapping(&self.config, &registry, self.dispatcher.keys())?;
        self.registry = registry;
        Ok(())
    }

    /// Detect entities without changing the document
    pub fn analyze(&self, document: &Value) -> Result<AnalysisReport> {
        let document_id = self.document_id(document);
        let output = self.walk(document, &self.mapping, &self.policy, WalkMode::Analyze)?;

        let report = AnalysisReport::new(
            document_id,
            output.analyzed_fields,
            output.detections,
            output.special_fields,
            output.failures,
        );

        if !report.complete {
            tracing::warn!(
                document_id = %report.document_id,
                failures = report.failures.len(),
                "Analysis is incomplete"
            );
        }

        Ok(report)
    }

    /// Anonymize with the configured operator mapping and field policy
    pub fn anonymize(&self, document: &Value) -> Result<AnonymizedDocument> {
        self.run(
            document,
            &self.mapping,
            &self.policy,
            self.config.anonymization.strategy.to_string(),
        )
    }

    /// Anonymize with a caller-supplied operator mapping and field policy
    ///
    /// The mapping is checked against every detectable entity type before
    /// the document is touched.
    pub fn anonymize_with(
        &self,
        document: &Value,
        mapping: &OperatorMapping,
        policy: &FieldPolicyTable,
    ) -> Result<AnonymizedDocument> {
        mapping.validate(&self.registry.entity_types(), self.dispatcher.keys())?;
        self.run(document, mapping, policy, "custom".to_string())
    }

    fn run(
        &self,
        document: &Value,
        mapping: &OperatorMapping,
        policy: &FieldPolicyTable,
        strategy: String,
    ) -> Result<AnonymizedDocument> {
        let start = Instant::now();
        let document_id = self.document_id(document);

        let output = self.walk(document, mapping, policy, WalkMode::Anonymize)?;

        let result = AnonymizedDocument::new(
            document_id,
            output.document,
            output.detections,
            output.special_fields,
            output.failures,
            strategy,
            start.elapsed().as_millis() as u64,
        );

        if result.complete {
            tracing::debug!(
                document_id = %result.document_id,
                detections = result.detections.len(),
                special_fields = result.special_fields.len(),
                "Document anonymized"
            );
        } else {
            tracing::warn!(
                document_id = %result.document_id,
                failures = result.failures.len(),
                "Document anonymized without full recognizer coverage"
            );
        }

        self.audit_logger
            .log_anonymization(&result)
            .map_err(|e| AnonymizerError::Io(format!("{e:#}")))?;

        Ok(result)
    }

    fn walk(
        &self,
        document: &Value,
        mapping: &OperatorMapping,
        policy: &FieldPolicyTable,
        mode: WalkMode,
    ) -> Result<WalkOutput> {
        DocumentWalker::new(
            &self.registry,
            self.resolver,
            &self.dispatcher,
            mapping,
            policy,
        )
        .with_max_depth(self.config.anonymization.max_depth)
        .with_entity_filter(self.entity_filter.as_ref())
        .process(document, mode)
    }

    /// Anonymize documents concurrently on the blocking pool
    ///
    /// At most `max_workers` documents are in flight. Results come back in
    /// input order; a failed document yields an `Err` in its slot and never
    /// any of its data.
    pub async fn anonymize_batch(
        self: &Arc<Self>,
        documents: Vec<Value>,
        max_workers: usize,
    ) -> Vec<Result<AnonymizedDocument>> {
        let workers = max_workers.max(1);
        let total = documents.len();

        let results: Vec<Result<AnonymizedDocument>> = stream::iter(documents)
            .map(|document| {
                let engine = Arc::clone(self);
                tokio::task::spawn_blocking(move || engine.anonymize(&document))
            })
            .buffered(workers)
            .map(|joined| joined.unwrap_or_else(|e| Err(AnonymizerError::Worker(e.to_string()))))
            .collect()
            .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::info!(
            documents = total,
            failed,
            workers,
            "Batch anonymization finished"
        );

        results
    }

    /// Anonymize a batch with the configured worker count and summarize it
    ///
    /// Failed documents are left out of the output and counted in the report.
    pub async fn anonymize_batch_with_report(
        self: &Arc<Self>,
        documents: Vec<Value>,
    ) -> (Vec<AnonymizedDocument>, BatchReport) {
        let results = self
            .anonymize_batch(documents, self.config.anonymization.max_workers)
            .await;

        let mut anonymized = Vec::with_capacity(results.len());
        let mut report = BatchReport::new();

        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(document) => {
                    report.add_document(&document);
                    anonymized.push(document);
                }
                Err(e) => {
                    tracing::error!(index, error = %e, "Failed to anonymize document");
                    report.add_failure(format!("Document {index}: {e}"));
                }
            }
        }

        (anonymized, report)
    }

    /// Document id from the configured top-level field, or a fresh UUID
    fn document_id(&self, document: &Value) -> String {
        match document.get(&self.config.anonymization.document_id_field) {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn config(&self) -> &AnonymizationConfig {
        &self.config
    }

    pub fn registry(&self) -> &RecognizerRegistry {
        &self.registry
    }

    /// Operator mapping in effect for [`anonymize`](Self::anonymize)
    pub fn mapping(&self) -> &OperatorMapping {
        &self.mapping
    }

    pub fn policy(&self) -> &FieldPolicyTable {
        &self.policy
    }

    /// Decrypt a token produced by an ENCRYPT operator of this run
    pub fn decrypt(&self, token: &str) -> Result<String> {
        self.dispatcher.keys().decrypt(token)
    }
}

impl std::fmt::Debug for AnonymizationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnonymizationEngine")
            .field("registry", &self.registry)
            .field("resolver", &self.resolver)
            .field("mapping", &self.mapping)
            .field("policy", &self.policy)
            .field("entity_filter", &self.entity_filter)
            .finish_non_exhaustive()
    }
}

fn build_mapping(
    config: &AnonymizationConfig,
    registry: &RecognizerRegistry,
    keys: &KeyRing,
) -> Result<OperatorMapping> {
    let entity_types = registry.entity_types();
    let settings = &config.anonymization;
    let mapping = settings.strategy.build_mapping(
        &settings.operators,
        &settings.replacement_tokens,
        &entity_types,
    );
    mapping.validate(&entity_types, keys)?;
    Ok(mapping)
}
