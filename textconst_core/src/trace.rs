use std::fmt;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Pipeline stages and traced actions. The discriminant is the event id sent
/// to a [`TraceSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
#[non_exhaustive]
pub enum TrackingName {
	OptionsSelected = 120,
	DeclarationsAndOptionsCombined = 130,
	DeclarationGlobSelected = 141,
	DeclarationGlobsCollected = 142,
	AssetGlobSelected = 143,
	MatchingAssetsFiltered = 144,
	GeneratingDocComment = 145,
	AssetContentTransformed = 146,
	MatchesSelected = 148,
	MatchesGrouped = 150,
	GenerationInputPrepared = 160,
	ArtifactAssembled = 170,
	DiagnosticTraceLogWritten = 180,
}

impl TrackingName {
	/// Every stage in evaluation order.
	pub const STAGES: [TrackingName; 11] = [
		Self::OptionsSelected,
		Self::DeclarationsAndOptionsCombined,
		Self::DeclarationGlobSelected,
		Self::DeclarationGlobsCollected,
		Self::AssetGlobSelected,
		Self::MatchingAssetsFiltered,
		Self::AssetContentTransformed,
		Self::MatchesSelected,
		Self::MatchesGrouped,
		Self::GenerationInputPrepared,
		Self::ArtifactAssembled,
	];

	pub fn id(self) -> u16 {
		self as u16
	}

	pub fn description(self) -> &'static str {
		match self {
			Self::OptionsSelected => "Selected generator options",
			Self::DeclarationsAndOptionsCombined => "Combined declarations and options",
			Self::DeclarationGlobSelected => "Selected declaration glob (path/extension)",
			Self::DeclarationGlobsCollected => "Collected declaration globs",
			Self::AssetGlobSelected => "Selected asset glob (directory/extension)",
			Self::MatchingAssetsFiltered => "Filtered assets matching declaration globs",
			Self::GeneratingDocComment => "Generating doc comment",
			Self::AssetContentTransformed => "Transformed asset content",
			Self::MatchesSelected => "Selected matching (declaration, asset) pairs",
			Self::MatchesGrouped => "Grouped assets by declaration",
			Self::GenerationInputPrepared => "Prepared generation input",
			Self::ArtifactAssembled => "Assembled artifact",
			Self::DiagnosticTraceLogWritten => "Diagnostic trace log written",
		}
	}
}

impl fmt::Display for TrackingName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:?}", self)
	}
}

/// One `(event id, payload)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
	pub id: u16,
	pub payload: u64,
}

impl TraceEvent {
	pub fn new(name: TrackingName, payload: u64) -> Self {
		Self {
			id: name.id(),
			payload,
		}
	}
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct TraceSinkError(pub String);

/// Receives diagnostic trace events. Failures are logged and otherwise
/// ignored by the pipeline.
pub trait TraceSink: Send + Sync {
	fn record(&self, event: TraceEvent) -> Result<(), TraceSinkError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTraceSink;

impl TraceSink for NoopTraceSink {
	fn record(&self, _event: TraceEvent) -> Result<(), TraceSinkError> {
		Ok(())
	}
}

/// Forwards events to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTraceSink;

impl TraceSink for TracingTraceSink {
	fn record(&self, event: TraceEvent) -> Result<(), TraceSinkError> {
		tracing::debug!(event_id = event.id, payload = event.payload, "diagnostic trace");
		Ok(())
	}
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct TraceBuffer {
	events: Mutex<Vec<TraceEvent>>,
}

impl TraceBuffer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn events(&self) -> Vec<TraceEvent> {
		self.events
			.lock()
			.map(|events| events.clone())
			.unwrap_or_default()
	}
}

impl TraceSink for TraceBuffer {
	fn record(&self, event: TraceEvent) -> Result<(), TraceSinkError> {
		self.events
			.lock()
			.map_err(|e| TraceSinkError(e.to_string()))?
			.push(event);
		Ok(())
	}
}
