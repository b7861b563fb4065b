#![warn(clippy::all, clippy::pedantic)]

#[cfg(test)]
mod tests {
    use crate::config::AudioConfig;
    use crate::sound::{AudioSink, AudioState, SoundEffect, generate_sound_sample};

    #[test]
    fn test_disabled_audio_is_silent() {
        let mut audio = AudioState::new(&AudioConfig {
            sound_enabled: false,
            volume: 0.7,
        });

        // Playing into a disabled sink is a no-op
        audio.play_sound(SoundEffect::LineClear);
        audio.play_sound(SoundEffect::GameOver);
        audio.shutdown();
    }

    #[test]
    fn test_effective_volume_is_clamped() {
        let volume = |volume| {
            AudioConfig {
                sound_enabled: true,
                volume,
            }
            .effective_volume()
        };

        assert!((volume(1.5) - 1.0).abs() < f32::EPSILON);
        assert!(volume(-0.2).abs() < f32::EPSILON);
        assert!((volume(0.25) - 0.25).abs() < f32::EPSILON);
        assert!(volume(f32::NAN).abs() < f32::EPSILON);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut audio = AudioState::disabled();
        audio.shutdown();
        audio.shutdown();
    }

    #[test]
    fn test_line_clear_is_a_rising_triad() {
        let frequencies: Vec<f32> = SoundEffect::LineClear
            .notes()
            .iter()
            .map(|n| n.frequency)
            .collect();

        assert_eq!(frequencies.len(), 3);
        assert!(frequencies.windows(2).all(|w| w[0] < w[1]));
        assert!((SoundEffect::LineClear.duration() - 0.45).abs() < 1e-4);
    }

    #[test]
    fn test_game_over_descends() {
        let notes = SoundEffect::GameOver.notes();

        assert_eq!(notes.len(), 4);
        assert!(notes.windows(2).all(|w| w[0].frequency > w[1].frequency));
        assert!((notes[3].duration - 0.4).abs() < 1e-6);
        assert!((SoundEffect::GameOver.duration() - 1.3).abs() < 1e-4);
    }

    #[test]
    fn test_samples_silent_outside_notes() {
        // Start of the envelope
        assert_eq!(generate_sound_sample(SoundEffect::LineClear, 0.0), (0.0, 0.0));
        // Gap between the first two notes
        assert_eq!(generate_sound_sample(SoundEffect::LineClear, 0.12), (0.0, 0.0));
        // After the cue
        assert_eq!(generate_sound_sample(SoundEffect::LineClear, 0.5), (0.0, 0.0));
        assert_eq!(generate_sound_sample(SoundEffect::GameOver, 2.0), (0.0, 0.0));
        assert_eq!(generate_sound_sample(SoundEffect::GameOver, -1.0), (0.0, 0.0));
    }

    #[test]
    fn test_samples_audible_during_notes() {
        let peak = (0..1000)
            .map(|i| f64::from(i) / 10_000.0)
            .map(|t| generate_sound_sample(SoundEffect::LineClear, t).0.abs())
            .fold(0.0_f32, f32::max);

        assert!(peak > 0.1, "First note should be audible, peak {peak}");
        assert!(peak <= 1.0);
    }

    #[test]
    fn test_samples_are_centered() {
        for i in 0..100 {
            let (left, right) = generate_sound_sample(SoundEffect::GameOver, f64::from(i) * 0.013);
            assert!((left - right).abs() < f32::EPSILON);
        }
    }
}
