//! Linking metadata: the fields that tie a log record to the service and
//! transaction that produced it.
//!
//! The tracing agent owns transactions, sampling and id generation. This
//! module only asks the agent for what it already knows and copies it.

use std::sync::Arc;

pub const ENTITY_NAME_KEY: &str = "entity.name";
pub const ENTITY_TYPE_KEY: &str = "entity.type";
pub const HOSTNAME_KEY: &str = "hostname";
pub const TRACE_ID_KEY: &str = "trace.id";
pub const SPAN_ID_KEY: &str = "span.id";

/// Entity type reported when the agent leaves it empty.
pub const ENTITY_TYPE_SERVICE: &str = "SERVICE";

/// Tracing state reachable from the current call, provided by the agent.
pub trait TracingContext: Send + Sync {
    /// The transaction in progress, if any.
    fn active_transaction(&self) -> Option<&dyn TransactionHandle>;
}

/// A transaction owned by the tracing agent.
pub trait TransactionHandle: Send + Sync {
    /// Snapshot of everything needed to link a record to this transaction.
    fn linking_metadata(&self) -> TransactionLinking;
}

/// Raw linking state as reported by the agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionLinking {
    pub entity_name: String,
    pub entity_type: String,
    /// Host name known to the agent; resolved locally when `None`.
    pub hostname: Option<String>,
    pub distributed_tracing_enabled: bool,
    pub sampled: bool,
    pub trace_id: String,
    pub span_sampling_enabled: bool,
    pub span_id: String,
}

/// Best-effort host name lookup. Failures are reported as `None`.
pub trait HostResolver: Send + Sync {
    fn hostname(&self) -> Option<String>;
}

/// Host name of the machine, looked up from the OS once at construction.
#[derive(Debug, Clone)]
pub struct SystemHostname {
    name: Option<String>,
}

impl SystemHostname {
    pub fn new() -> Self {
        let name = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .filter(|h| !h.is_empty());
        SystemHostname { name }
    }
}

impl Default for SystemHostname {
    fn default() -> Self {
        Self::new()
    }
}

impl HostResolver for SystemHostname {
    fn hostname(&self) -> Option<String> {
        self.name.clone()
    }
}

/// Linking fields derived for a single log call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkingMetadata {
    pub entity_name: String,
    pub entity_type: String,
    pub hostname: Option<String>,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
}

impl LinkingMetadata {
    /// Present fields as `(key, value)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (ENTITY_NAME_KEY, Some(self.entity_name.as_str())),
            (ENTITY_TYPE_KEY, Some(self.entity_type.as_str())),
            (HOSTNAME_KEY, self.hostname.as_deref()),
            (TRACE_ID_KEY, self.trace_id.as_deref()),
            (SPAN_ID_KEY, self.span_id.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
    }
}

/// Derive linking metadata from the context of the current call.
///
/// Returns `None` without a context or without an active transaction.
/// `trace.id` needs distributed tracing and a sampled transaction;
/// `span.id` additionally needs span sampling. Empty ids count as absent.
pub fn link(
    context: Option<&dyn TracingContext>,
    resolver: &dyn HostResolver,
) -> Option<LinkingMetadata> {
    let txn = context?.active_transaction()?;
    let md = txn.linking_metadata();

    let traced = md.distributed_tracing_enabled && md.sampled;
    let trace_id = non_empty(md.trace_id).filter(|_| traced);
    let span_id = non_empty(md.span_id).filter(|_| trace_id.is_some() && md.span_sampling_enabled);

    let entity_type = non_empty(md.entity_type).unwrap_or_else(|| ENTITY_TYPE_SERVICE.to_string());
    let hostname = md
        .hostname
        .and_then(non_empty)
        .or_else(|| resolver.hostname());

    Some(LinkingMetadata {
        entity_name: md.entity_name,
        entity_type,
        hostname,
        trace_id,
        span_id,
    })
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

impl<T: TracingContext + ?Sized> TracingContext for Arc<T> {
    fn active_transaction(&self) -> Option<&dyn TransactionHandle> {
        (**self).active_transaction()
    }
}

impl<T: HostResolver + ?Sized> HostResolver for Arc<T> {
    fn hostname(&self) -> Option<String> {
        (**self).hostname()
    }
}
