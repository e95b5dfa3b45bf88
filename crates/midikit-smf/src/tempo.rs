//! Tempo-map derivation.
//!
//! The SMF layer itself is agnostic to wall time; this is a derived view
//! built by scanning tempo meta events across all tracks.

use crate::file::{MidiFile, SmfEvent, TimeBase};
use crate::meta::MetaEvent;

/// Microseconds per quarter note until further notice, effective at `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TempoEntry {
    pub tick: u64,
    pub micros_per_quarter: u32,
}

/// Default tempo when a file carries no tempo event: 120 BPM.
pub const DEFAULT_MICROS_PER_QUARTER: u32 = 500_000;

/// A tick-ordered tempo table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TempoMap {
    entries: Vec<TempoEntry>,
}

impl TempoMap {
    /// Scans every track for tempo events. When several tracks set a tempo
    /// at the same tick, the later chunk wins.
    pub fn from_file(file: &MidiFile) -> Self {
        let mut entries: Vec<TempoEntry> = Vec::new();
        for events in file.tracks() {
            let mut tick: u64 = 0;
            for event in events {
                tick += event.delta as u64;
                if let SmfEvent::Meta(MetaEvent::Tempo { micros_per_quarter }) = event.event {
                    entries.push(TempoEntry {
                        tick,
                        micros_per_quarter,
                    });
                }
            }
        }
        entries.sort_by_key(|entry| entry.tick);
        entries.dedup_by(|next, prev| {
            if next.tick == prev.tick {
                prev.micros_per_quarter = next.micros_per_quarter;
                true
            } else {
                false
            }
        });
        if entries.first().map(|e| e.tick) != Some(0) {
            entries.insert(
                0,
                TempoEntry {
                    tick: 0,
                    micros_per_quarter: DEFAULT_MICROS_PER_QUARTER,
                },
            );
        }
        Self { entries }
    }

    /// The tempo in effect at `tick`.
    pub fn micros_per_quarter_at(&self, tick: u64) -> u32 {
        self.entries
            .iter()
            .take_while(|entry| entry.tick <= tick)
            .last()
            .map(|entry| entry.micros_per_quarter)
            .unwrap_or(DEFAULT_MICROS_PER_QUARTER)
    }

    /// Converts a musical tick position to microseconds from the start.
    pub fn tick_to_micros(&self, tick: u64, ticks_per_quarter: u16) -> u64 {
        let tpq = ticks_per_quarter.max(1) as u128;
        let mut micros: u128 = 0;
        let mut last_tick: u64 = 0;
        let mut last_tempo = DEFAULT_MICROS_PER_QUARTER;
        for entry in &self.entries {
            if entry.tick >= tick {
                break;
            }
            micros += (entry.tick - last_tick) as u128 * last_tempo as u128 / tpq;
            last_tick = entry.tick;
            last_tempo = entry.micros_per_quarter;
        }
        micros += (tick - last_tick) as u128 * last_tempo as u128 / tpq;
        micros as u64
    }

    /// The ordered entries.
    pub fn entries(&self) -> &[TempoEntry] {
        &self.entries
    }
}

impl MidiFile {
    /// Derives the tempo map by scanning tempo meta events.
    pub fn tempo_map(&self) -> TempoMap {
        TempoMap::from_file(self)
    }

    /// Wall-clock position of a tick, for musical time bases.
    pub fn tick_to_micros(&self, tick: u64) -> Option<u64> {
        match self.time_base {
            TimeBase::Musical { ticks_per_quarter } => {
                Some(self.tempo_map().tick_to_micros(tick, ticks_per_quarter))
            }
            TimeBase::Timecode { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{Chunk, SmfFormat, TrackEvent};

    fn file_with_tempos(tempos: &[(u32, u32)]) -> MidiFile {
        let mut events: Vec<TrackEvent> = tempos
            .iter()
            .map(|&(delta, micros_per_quarter)| {
                TrackEvent::new(delta, SmfEvent::Meta(MetaEvent::Tempo { micros_per_quarter }))
            })
            .collect();
        events.push(TrackEvent::new(0, SmfEvent::Meta(MetaEvent::EndOfTrack)));
        let mut file = MidiFile::new(
            SmfFormat::SingleTrack,
            TimeBase::Musical {
                ticks_per_quarter: 480,
            },
        );
        file.chunks.push(Chunk::Track(events));
        file
    }

    #[test]
    fn test_default_tempo_when_absent() {
        let map = file_with_tempos(&[]).tempo_map();
        assert_eq!(map.micros_per_quarter_at(0), DEFAULT_MICROS_PER_QUARTER);
        // One quarter note at 120 BPM is half a second.
        assert_eq!(map.tick_to_micros(480, 480), 500_000);
    }

    #[test]
    fn test_tempo_change_mid_file() {
        // 120 BPM from 0, 60 BPM from tick 480.
        let map = file_with_tempos(&[(0, 500_000), (480, 1_000_000)]).tempo_map();
        assert_eq!(map.micros_per_quarter_at(0), 500_000);
        assert_eq!(map.micros_per_quarter_at(479), 500_000);
        assert_eq!(map.micros_per_quarter_at(480), 1_000_000);
        assert_eq!(map.tick_to_micros(480, 480), 500_000);
        assert_eq!(map.tick_to_micros(960, 480), 1_500_000);
    }

    #[test]
    fn test_same_tick_last_wins() {
        let map = file_with_tempos(&[(0, 500_000), (0, 250_000)]).tempo_map();
        assert_eq!(map.entries().len(), 1);
        assert_eq!(map.micros_per_quarter_at(0), 250_000);
    }

    #[test]
    fn test_timecode_base_has_no_tick_conversion() {
        let file = MidiFile::new(
            SmfFormat::SingleTrack,
            TimeBase::Timecode {
                fps: crate::file::SmpteFps::Fps25,
                ticks_per_frame: 40,
            },
        );
        assert_eq!(file.tick_to_micros(100), None);
    }
}
