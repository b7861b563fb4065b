use anyhow::Result;
use bevy_ecs::system::Resource;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use crossbeam_channel::{Receiver, Sender, bounded};
use log::{debug, error, info, warn};
use std::thread;

use crate::config::AudioConfig;

// Sound effects the playfield can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    LineClear,
    GameOver,
}

/// Fire-and-forget cue player. Implementations must never block the caller.
pub trait AudioSink {
    fn play_sound(&mut self, effect: SoundEffect);
}

/// One tone of a cue followed by a silent gap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub frequency: f32,
    pub duration: f32,
    pub gap: f32,
}

const fn note(frequency: f32, duration_ms: u16, gap_ms: u16) -> Note {
    Note {
        frequency,
        duration: duration_ms as f32 / 1000.0,
        gap: gap_ms as f32 / 1000.0,
    }
}

// C5, E5, G5
const LINE_CLEAR_NOTES: [Note; 3] = [
    note(523.25, 100, 50),
    note(659.25, 100, 50),
    note(783.99, 150, 0),
];

// G4, F4, D4, C4
const GAME_OVER_NOTES: [Note; 4] = [
    note(392.00, 200, 100),
    note(349.23, 200, 100),
    note(293.66, 200, 100),
    note(261.63, 400, 0),
];

// Share of a note spent ramping in and out
const ENVELOPE_FRACTION: f32 = 0.1;
const NOTE_AMPLITUDE: f32 = 0.4;

impl SoundEffect {
    #[must_use]
    pub fn notes(self) -> &'static [Note] {
        match self {
            Self::LineClear => &LINE_CLEAR_NOTES,
            Self::GameOver => &GAME_OVER_NOTES,
        }
    }

    /// Length of the whole cue in seconds, gaps included.
    #[must_use]
    pub fn duration(self) -> f32 {
        self.notes().iter().map(|n| n.duration + n.gap).sum()
    }
}

// Command to control the audio thread
enum AudioCommand {
    PlaySound(SoundEffect),
    Quit,
}

// Global audio state
#[derive(Resource)]
pub struct AudioState {
    sender: Option<Sender<AudioCommand>>,
}

impl AudioState {
    /// Starts the audio thread unless sound is disabled in `config`.
    #[must_use]
    pub fn new(config: &AudioConfig) -> Self {
        let volume = config.effective_volume();
        if !config.sound_enabled {
            info!("Sound disabled, audio thread not started");
            return Self::disabled();
        }

        let (sender, receiver) = bounded(64);
        let spawned = thread::Builder::new()
            .name("audio".into())
            .spawn(move || {
                if let Err(e) = run_audio_thread(receiver, volume) {
                    warn!("Audio unavailable, continuing without sound: {e}");
                }
            });
        if let Err(e) = spawned {
            error!("Failed to spawn audio thread: {e}");
            return Self::disabled();
        }

        info!("Sound enabled at volume {volume}");
        Self {
            sender: Some(sender),
        }
    }

    /// Silent state with no thread behind it.
    #[must_use]
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Asks the audio thread to stop. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.try_send(AudioCommand::Quit);
        }
    }
}

impl AudioSink for AudioState {
    fn play_sound(&mut self, effect: SoundEffect) {
        if let Some(sender) = &self.sender {
            // A full queue drops the cue rather than stalling the tick
            if sender.try_send(AudioCommand::PlaySound(effect)).is_err() {
                debug!("Dropped {effect:?} cue");
            }
        }
    }
}

impl Drop for AudioState {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_audio_thread(receiver: Receiver<AudioCommand>, volume: f32) -> Result<()> {
    // Get the default audio device
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("No audio output device found"))?;
    let config = device.default_output_config()?;

    let (sound_sender, sound_receiver) = bounded::<SoundEffect>(64);

    // Set up audio stream based on the device's sample format
    let _stream = match config.sample_format() {
        cpal::SampleFormat::F32 => run_audio_stream::<f32>(
            &device,
            &config.into(),
            sound_receiver,
            volume,
        )?,
        cpal::SampleFormat::I16 => run_audio_stream::<i16>(
            &device,
            &config.into(),
            sound_receiver,
            volume,
        )?,
        cpal::SampleFormat::U16 => run_audio_stream::<u16>(
            &device,
            &config.into(),
            sound_receiver,
            volume,
        )?,
        _ => return Err(anyhow::anyhow!("Unsupported audio format")),
    };
    info!("Audio stream started");

    // Keep the thread alive and process commands
    while let Ok(command) = receiver.recv() {
        match command {
            AudioCommand::PlaySound(effect) => {
                let _ = sound_sender.try_send(effect);
            }
            AudioCommand::Quit => break,
        }
    }

    debug!("Audio thread exiting");
    Ok(())
}

fn run_audio_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sound_receiver: Receiver<SoundEffect>,
    volume: f32,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let sample_rate = f64::from(config.sample_rate.0);
    let channels = config.channels as usize;

    // Active cues with their start time
    let mut active_sounds: Vec<(SoundEffect, f64)> = Vec::new();
    let mut current_time = 0.0;

    let mut next_value = move || {
        while let Ok(effect) = sound_receiver.try_recv() {
            active_sounds.push((effect, current_time));
        }

        active_sounds
            .retain(|(effect, start)| current_time - start <= f64::from(effect.duration()));

        let mut sample: f32 = active_sounds
            .iter()
            .map(|(effect, start)| generate_sound_sample(*effect, current_time - start).0)
            .sum();

        current_time += 1.0 / sample_rate;

        sample = (sample * volume).clamp(-1.0, 1.0);
        (sample, sample)
    };

    let err_fn = |err| error!("Error in audio stream: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(channels) {
                let sample = next_value();
                let left = T::from_sample(sample.0);
                let right = T::from_sample(sample.1);

                for (channel, sample) in frame.iter_mut().enumerate() {
                    if channel & 1 == 0 {
                        *sample = left;
                    } else {
                        *sample = right;
                    }
                }
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok(stream)
}

/// Linear ramp in and out over the first and last tenth of a note.
fn envelope(t: f32, duration: f32) -> f32 {
    let ramp = duration * ENVELOPE_FRACTION;
    if ramp <= 0.0 {
        return 1.0;
    }
    if t < ramp {
        t / ramp
    } else if t > duration - ramp {
        ((duration - t) / ramp).max(0.0)
    } else {
        1.0
    }
}

/// Stereo sample of `effect` at `t` seconds after the cue started.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn generate_sound_sample(effect: SoundEffect, t: f64) -> (f32, f32) {
    let mut t = t as f32;
    if t < 0.0 {
        return (0.0, 0.0);
    }

    for note in effect.notes() {
        if t < note.duration {
            let amp = envelope(t, note.duration) * NOTE_AMPLITUDE;
            let sample = (t * note.frequency * std::f32::consts::TAU).sin() * amp;
            return (sample, sample);
        }
        t -= note.duration;
        if t < note.gap {
            return (0.0, 0.0);
        }
        t -= note.gap;
    }
    (0.0, 0.0)
}
