//! Per-stage memoization keyed by structural equality.
//!
//! Every stage output lives in a slot (an asset path, a declaration id, or
//! `()` for whole-collection stages). A slot is recomputed only when
//! the input recorded for it differs from the input seen in the previous run.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::TextConstResult;
use crate::trace::TrackingName;

/// Why a stage produced the value it did for one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepReason {
	/// The slot did not exist in the previous run.
	New,
	/// The input was equal to the previous run's, so the cached output was
	/// reused without recomputation.
	Cached,
	/// The input changed but the recomputed output compared equal, so
	/// downstream stages see no change.
	Unchanged,
	/// Both input and output changed.
	Modified,
	/// The slot existed in the previous run but not in this one.
	Removed,
}

impl StepReason {
	/// Whether downstream stages observe a different value for this slot.
	pub fn is_change(self) -> bool {
		matches!(self, Self::New | Self::Modified | Self::Removed)
	}
}

/// Content hash used where a large shared collection keys many slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
	pub fn of<T: Hash + ?Sized>(value: &T) -> Self {
		let mut hasher = DefaultHasher::new();
		value.hash(&mut hasher);
		Self(hasher.finish())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheEntry<I, O> {
	input: I,
	output: O,
}

/// Memoized `slot → (input, output)` table of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCache<S, I, O> {
	entries: BTreeMap<S, CacheEntry<I, O>>,
}

impl<S, I, O> Default for StageCache<S, I, O> {
	fn default() -> Self {
		Self {
			entries: BTreeMap::new(),
		}
	}
}

impl<S: Ord, I, O> StageCache<S, I, O> {
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn output(&self, slot: &S) -> Option<&O> {
		self.entries.get(slot).map(|entry| &entry.output)
	}
}

impl<S: Serialize, I: Serialize, O: Serialize> Serialize for StageCache<S, I, O> {
	fn serialize<Z: Serializer>(&self, serializer: Z) -> Result<Z::Ok, Z::Error> {
		serializer.collect_seq(
			self.entries
				.iter()
				.map(|(slot, entry)| (slot, &entry.input, &entry.output)),
		)
	}
}

impl<'de, S, I, O> Deserialize<'de> for StageCache<S, I, O>
where
	S: Deserialize<'de> + Ord,
	I: Deserialize<'de>,
	O: Deserialize<'de>,
{
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let entries = Vec::<(S, I, O)>::deserialize(deserializer)?;
		Ok(Self {
			entries: entries
				.into_iter()
				.map(|(slot, input, output)| (slot, CacheEntry { input, output }))
				.collect(),
		})
	}
}

/// Reasons recorded by one stage during one run, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
	pub name: TrackingName,
	pub reasons: Vec<StepReason>,
}

impl StageReport {
	pub fn count(&self, reason: StepReason) -> usize {
		self.reasons.iter().filter(|r| **r == reason).count()
	}

	/// True when every evaluated slot reused its cached output.
	pub fn is_fully_cached(&self) -> bool {
		self.reasons.iter().all(|reason| *reason == StepReason::Cached)
	}
}

/// A stage being evaluated: reads the previous run's cache and builds the
/// next one. Nothing is written to the previous cache, so an aborted run
/// leaves it intact.
pub struct StageRun<'a, S, I, O> {
	name: TrackingName,
	previous: &'a StageCache<S, I, O>,
	next: StageCache<S, I, O>,
	reasons: Vec<StepReason>,
}

impl<'a, S, I, O> StageRun<'a, S, I, O>
where
	S: Ord + Clone,
	I: PartialEq,
	O: PartialEq + Clone,
{
	pub fn new(name: TrackingName, previous: &'a StageCache<S, I, O>) -> Self {
		Self {
			name,
			previous,
			next: StageCache::default(),
			reasons: Vec::new(),
		}
	}

	/// Produce the output for `slot`, reusing the previous output when
	/// `input` is structurally equal to the previous input.
	pub fn step(
		&mut self,
		slot: S,
		input: I,
		compute: impl FnOnce(&I) -> TextConstResult<O>,
	) -> TextConstResult<O> {
		let previous = self.previous.entries.get(&slot);
		let (output, reason) = match previous {
			Some(entry) if entry.input == input => (entry.output.clone(), StepReason::Cached),
			Some(entry) => {
				let output = compute(&input)?;
				if output == entry.output {
					// Keep the previous value so later comparisons stay stable.
					(entry.output.clone(), StepReason::Unchanged)
				} else {
					(output, StepReason::Modified)
				}
			}
			None => (compute(&input)?, StepReason::New),
		};

		self.reasons.push(reason);
		self.next
			.entries
			.insert(slot, CacheEntry {
				input,
				output: output.clone(),
			});
		Ok(output)
	}

	/// Reason recorded by the most recent [`step`](Self::step).
	pub fn last_reason(&self) -> Option<StepReason> {
		self.reasons.last().copied()
	}

	/// Close the stage, recording every slot that disappeared as removed.
	pub fn finish(mut self) -> (StageCache<S, I, O>, StageReport) {
		let removed = self
			.previous
			.entries
			.keys()
			.filter(|slot| !self.next.entries.contains_key(*slot))
			.count();
		self.reasons
			.extend(std::iter::repeat_n(StepReason::Removed, removed));

		tracing::debug!(
			stage = %self.name,
			slots = self.next.entries.len(),
			removed,
			"stage evaluated"
		);

		(self.next, StageReport {
			name: self.name,
			reasons: self.reasons,
		})
	}
}
