//! Adapters: Kubernetes API client, rate-limit store, audit sink, translator.

#![forbid(unsafe_code)]

mod in_memory_rate_limit_repository;
mod kube_http_client;
mod ollama_translator;
mod tracing_audit_sink;

pub use in_memory_rate_limit_repository::InMemoryRateLimitRepository;
pub use kube_http_client::{KubeApiConfig, KubeHttpClient};
pub use ollama_translator::{OllamaConfig, OllamaTranslator};
pub use tracing_audit_sink::TracingAuditSink;
