// MIDI output for rendered note events.
//
// Converts the `NoteEvent` spans collected by `render.rs` into a Standard
// MIDI File for auditioning a configuration away from the host. Sample
// positions are converted to ticks through the sample rate and tempo. Pitch
// CV maps to MIDI keys at 12 keys per volt, with 0 V on `base_key`.
//
// Uses the `midly` crate. Output is SMF format 0 (one track).

use std::path::Path;

use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use serde::{Deserialize, Serialize};

use crate::error::MelodyError;
use crate::render::NoteEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiSettings {
    pub ticks_per_quarter: u16,
    pub tempo_bpm: f32,
    /// MIDI key for 0 V. 60 is middle C.
    pub base_key: u8,
    pub channel: u8,
    pub velocity: u8,
    /// Sample rate the events were rendered at.
    pub sample_rate: f32,
}

impl Default for MidiSettings {
    fn default() -> Self {
        MidiSettings {
            ticks_per_quarter: 480,
            tempo_bpm: 120.0,
            base_key: 60,
            channel: 0,
            velocity: 96,
            sample_rate: 48_000.0,
        }
    }
}

impl MidiSettings {
    fn sample_to_tick(&self, sample: u64) -> u32 {
        let seconds = sample as f64 / f64::from(self.sample_rate);
        let quarters = seconds * f64::from(self.tempo_bpm) / 60.0;
        (quarters * f64::from(self.ticks_per_quarter)).round() as u32
    }

    /// MIDI key for a pitch CV, clamped to 0–127.
    pub fn key_for(&self, pitch_volts: f32) -> u8 {
        let key = i32::from(self.base_key) + (pitch_volts * 12.0).round() as i32;
        key.clamp(0, 127) as u8
    }
}

/// Convert events to MIDI and write to a file.
pub fn write_midi(
    events: &[NoteEvent],
    settings: &MidiSettings,
    path: &Path,
) -> Result<(), MelodyError> {
    let smf = events_to_smf(events, settings)?;
    let mut buf = Vec::new();
    smf.write(&mut buf)
        .map_err(|e| MelodyError::Midi(e.to_string()))?;
    std::fs::write(path, &buf)?;
    log::info!("wrote {} notes to {}", events.len(), path.display());
    Ok(())
}

/// Convert events to an in-memory SMF.
pub fn events_to_smf(
    events: &[NoteEvent],
    settings: &MidiSettings,
) -> Result<Smf<'static>, MelodyError> {
    if !(settings.sample_rate > 0.0 && settings.tempo_bpm > 0.0) {
        return Err(MelodyError::Midi(format!(
            "sample_rate and tempo_bpm must be positive (got {} and {})",
            settings.sample_rate, settings.tempo_bpm
        )));
    }
    if settings.channel > 15 || settings.velocity > 127 || settings.ticks_per_quarter > 0x7fff {
        return Err(MelodyError::Midi(
            "channel must be 0-15, velocity 0-127, ticks_per_quarter below 32768".into(),
        ));
    }

    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(settings.ticks_per_quarter)),
    ));
    let channel = u4::new(settings.channel);
    let mut track: Track<'static> = Vec::new();

    let tempo_microseconds = (60_000_000.0 / settings.tempo_bpm).round() as u32;
    if tempo_microseconds > 0x00ff_ffff {
        return Err(MelodyError::Midi(format!(
            "tempo {} bpm is too slow to encode",
            settings.tempo_bpm
        )));
    }
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
    });
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(b"melodygen")),
    });

    let mut last_tick = 0u32;
    for event in events {
        let on = settings.sample_to_tick(event.start).max(last_tick);
        let off = settings
            .sample_to_tick(event.start + event.length)
            .max(on);
        let key = u7::new(settings.key_for(event.pitch_volts));

        track.push(TrackEvent {
            delta: u28::new(on - last_tick),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key,
                    vel: u7::new(settings.velocity),
                },
            },
        });
        track.push(TrackEvent {
            delta: u28::new(off - on),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key,
                    vel: u7::new(0),
                },
            },
        });
        last_tick = off;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);
    Ok(smf)
}
