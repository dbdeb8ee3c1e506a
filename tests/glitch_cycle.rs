use glitchtext::glitch::{resolution_scale, GlitchGenerator};
use glitchtext::glitch_config::{GlitchConfig, GlitchKind};
use glitchtext::math::{Vec2, Vec3};

fn quiet_config() -> GlitchConfig {
    GlitchConfig {
        seed: Some(42),
        character_displacement: false,
        rgb_separation: false,
        chromatic_aberration: false,
        text_slicing: false,
        block_displacement: false,
        text_duplication: false,
        random_corruption: false,
        ..GlitchConfig::default()
    }
}

fn initialized(config: GlitchConfig) -> GlitchGenerator {
    let mut generator = GlitchGenerator::new(config).expect("config should validate");
    assert!(generator.initialize());
    generator
}

/// Triggers a glitch and advances to the envelope peak.
fn at_full_intensity(config: GlitchConfig) -> GlitchGenerator {
    let mut generator = initialized(GlitchConfig {
        intensity: 1.0,
        duration: 5.0,
        ..config
    });
    generator.trigger_glitch();
    generator.update(1.0);
    assert_eq!(generator.current_intensity(), 1.0);
    generator
}

#[test]
fn idle_and_active_phases_alternate_on_schedule() {
    let mut generator = initialized(GlitchConfig {
        idle_time: 2.0,
        duration: 1.0,
        ..GlitchConfig::default()
    });

    for _ in 0..7 {
        generator.update(0.25);
        assert!(!generator.is_active(), "still idle at {}", generator.elapsed_time());
    }
    generator.update(0.25);
    assert!(generator.is_active(), "glitch should start once idle time runs out");
    let first_seed = generator.noise_seed();

    for _ in 0..3 {
        generator.update(0.25);
        assert!(generator.is_active());
    }
    generator.update(0.25);
    assert!(!generator.is_active(), "glitch should end after its duration");
    assert_eq!(generator.current_intensity(), 0.0);
    assert_ne!(generator.noise_seed(), first_seed);
    assert_eq!(generator.elapsed_time(), 3.0);
}

#[test]
fn intensity_stays_within_configured_peak() {
    let mut generator = initialized(GlitchConfig {
        idle_time: 0.5,
        duration: 0.4,
        intensity: 0.6,
        ..GlitchConfig::default()
    });

    let mut peak = 0.0_f32;
    for _ in 0..600 {
        generator.update(1.0 / 60.0);
        let intensity = generator.current_intensity();
        assert!((0.0..=0.6).contains(&intensity), "intensity {intensity}");
        if !generator.is_active() {
            assert_eq!(intensity, 0.0);
        }
        peak = peak.max(intensity);
    }
    assert!(peak > 0.5, "envelope should approach its peak, got {peak}");
}

#[test]
fn bad_deltas_do_not_advance_time() {
    let mut generator = initialized(GlitchConfig::default());
    generator.update(-1.0);
    generator.update(f32::NAN);
    generator.update(f32::INFINITY);
    assert_eq!(generator.elapsed_time(), 0.0);
    assert!(!generator.is_active());
}

#[test]
fn inactive_generators_return_neutral_states() {
    let idle = initialized(GlitchConfig::default());
    let disabled = initialized(GlitchConfig {
        enabled: false,
        duration: 0.0,
        ..GlitchConfig::default()
    });
    let uninitialized = GlitchGenerator::new(GlitchConfig::default()).expect("valid config");

    for generator in [&idle, &disabled, &uninitialized] {
        for index in 0..32 {
            assert!(generator.get_character_state(index, 32).is_neutral());
        }
    }
}

#[test]
fn empty_and_out_of_range_queries_are_total() {
    let generator = at_full_intensity(GlitchConfig {
        seed: Some(3),
        ..GlitchConfig::default()
    });
    let state = generator.get_character_state(0, 0);
    assert!(state.offset.x.is_finite() && state.offset.y.is_finite());

    let state = generator.get_character_state(99, 4);
    assert!(state.offset.x.is_finite() && state.offset.y.is_finite());
}

#[test]
fn queries_are_pure_within_a_frame() {
    let generator = at_full_intensity(GlitchConfig {
        seed: Some(11),
        ..GlitchConfig::default()
    });
    for index in 0..24 {
        assert_eq!(
            generator.get_character_state(index, 24),
            generator.get_character_state(index, 24)
        );
    }
}

#[test]
fn same_seed_produces_same_frames() {
    let config = GlitchConfig {
        seed: Some(1234),
        idle_time: 0.3,
        duration: 0.5,
        ..GlitchConfig::default()
    };
    let mut a = initialized(config.clone());
    let mut b = initialized(config);

    for _ in 0..120 {
        a.update(1.0 / 60.0);
        b.update(1.0 / 60.0);
        for index in 0..16 {
            assert_eq!(a.get_character_state(index, 16), b.get_character_state(index, 16));
        }
    }
}

#[test]
fn resolution_scale_follows_tighter_axis() {
    assert_eq!(resolution_scale(1920, 1080), 1.0);
    assert_eq!(resolution_scale(960, 540), 0.5);
    assert_eq!(resolution_scale(3840, 1080), 1.0);
    assert_eq!(resolution_scale(100, 100), 0.3);
    assert_eq!(resolution_scale(7680, 4320), 3.0);

    let mut generator = initialized(GlitchConfig::default());
    generator.set_screen_size(960, 540);
    assert_eq!(generator.resolution_scale(), 0.5);
    assert_eq!(generator.screen_size(), (960, 540));
}

#[test]
fn full_corruption_hides_every_character() {
    let generator = at_full_intensity(GlitchConfig {
        random_corruption: true,
        corruption_chance: 1.0,
        ..quiet_config()
    });
    for index in 0..20 {
        assert!(!generator.get_character_state(index, 20).visible);
    }

    let generator = at_full_intensity(GlitchConfig {
        random_corruption: true,
        corruption_chance: 0.0,
        ..quiet_config()
    });
    for index in 0..20 {
        assert!(generator.get_character_state(index, 20).visible);
    }
}

#[test]
fn duplication_requires_active_glitch_above_gate() {
    let config = GlitchConfig {
        text_duplication: true,
        duplication_chance: 1.0,
        ..quiet_config()
    };

    let idle = initialized(config.clone());
    assert!(!idle.get_character_state(0, 4).duplicate);

    let active = at_full_intensity(config.clone());
    for index in 0..8 {
        let state = active.get_character_state(index, 8);
        assert!(state.duplicate);
        assert!(state.duplicate_offset.x.abs() <= 5.0);
        assert!(state.duplicate_offset.y.abs() <= 2.5);
    }

    let mut weak = initialized(GlitchConfig {
        intensity: 0.25,
        duration: 5.0,
        ..config
    });
    weak.trigger_glitch();
    weak.update(1.0);
    assert!(!weak.get_character_state(0, 4).duplicate);
}

#[test]
fn slicing_moves_characters_horizontally_only() {
    let generator = at_full_intensity(GlitchConfig {
        text_slicing: true,
        slice_height: 1.0,
        max_slice_offset: 30.0,
        ..quiet_config()
    });

    let mut sliced = 0;
    for index in 0..10 {
        let state = generator.get_character_state(index, 10);
        assert_eq!(state.offset.y, 0.0);
        if state.in_slice_zone {
            sliced += 1;
            assert_eq!(state.offset.x, state.slice_offset);
            assert!(state.slice_offset.abs() <= 30.0);
        }
    }
    assert!(sliced > 0);
}

#[test]
fn blocks_move_together_within_half_height_reach() {
    let mut moved_blocks = 0;
    for seed in 0..20 {
        let generator = at_full_intensity(GlitchConfig {
            seed: Some(seed),
            block_displacement: true,
            block_size: 0.25,
            max_block_offset: 20.0,
            ..quiet_config()
        });

        // Eight characters at a quarter each gives blocks of two.
        for block in 0..4 {
            let first = generator.get_character_state(block * 2, 8);
            let second = generator.get_character_state(block * 2 + 1, 8);
            assert_eq!(first.offset, second.offset, "seed {seed}, block {block}");

            let offset = first.offset;
            assert!(offset.x.abs() <= 20.0 && offset.y.abs() <= 10.0, "{offset:?}");
            if offset.x != 0.0 || offset.y != 0.0 {
                // Only draws at or above 0.6 move, which pushes right.
                assert!(offset.x >= 3.99, "{offset:?}");
                moved_blocks += 1;
            }
        }
    }
    assert!(moved_blocks > 0);
    assert!(moved_blocks < 80, "some blocks must stay in place");
}

#[test]
fn tiny_blocks_fall_back_to_single_characters() {
    let differs = (0..20).any(|seed| {
        let generator = at_full_intensity(GlitchConfig {
            seed: Some(seed),
            block_displacement: true,
            block_size: 0.0,
            ..quiet_config()
        });
        let offsets: Vec<_> = (0..8)
            .map(|index| generator.get_character_state(index, 8).offset)
            .collect();
        offsets.windows(2).any(|pair| pair[0] != pair[1])
    });
    assert!(differs, "one-character blocks should move independently");
}

#[test]
fn chromatic_aberration_takes_precedence_over_rgb_separation() {
    let config = GlitchConfig {
        rgb_separation: true,
        chromatic_aberration: true,
        chromatic_intensity: 1.0,
        glitch_color: Vec3::ZERO,
        ..quiet_config()
    };

    let chromatic = at_full_intensity(config.clone()).get_character_state(0, 3).color_mod;
    assert!((chromatic.x - 1.8).abs() < 1e-5, "{chromatic:?}");
    assert!((chromatic.y - 0.5).abs() < 1e-5, "{chromatic:?}");
    assert!((chromatic.z - 0.3).abs() < 1e-5, "{chromatic:?}");

    let separated = at_full_intensity(GlitchConfig {
        chromatic_aberration: false,
        ..config
    })
    .get_character_state(0, 3)
    .color_mod;
    assert!((separated.x - 1.5).abs() < 1e-5, "{separated:?}");
    assert!((separated.y - 0.7).abs() < 1e-5, "{separated:?}");
    assert!((separated.z - 0.7).abs() < 1e-5, "{separated:?}");
}

#[test]
fn displacement_waits_for_intensity_gate() {
    let config = GlitchConfig {
        character_displacement: true,
        max_jitter: 6.0,
        vertical_jitter: 3.0,
        ..quiet_config()
    };

    let mut weak = initialized(GlitchConfig {
        intensity: 0.1,
        duration: 5.0,
        ..config.clone()
    });
    weak.trigger_glitch();
    weak.update(1.0);
    assert_eq!(weak.current_intensity(), 0.1);
    for index in 0..16 {
        let state = weak.get_character_state(index, 16);
        assert_eq!(state.offset, Vec2::ZERO);
    }

    let strong = at_full_intensity(config);
    let moved = (0..16).any(|index| {
        let offset = strong.get_character_state(index, 16).offset;
        offset.x != 0.0 || offset.y != 0.0
    });
    assert!(moved);
}

#[test]
fn chromatic_kind_only_recolors() {
    let generator = at_full_intensity(GlitchConfig {
        seed: Some(21),
        kind: GlitchKind::Chromatic,
        duplication_chance: 1.0,
        random_corruption: false,
        ..GlitchConfig::default()
    });

    for index in 0..12 {
        let state = generator.get_character_state(index, 12);
        assert_eq!(state.offset, Vec2::ZERO);
        assert!(!state.duplicate);
        assert!(!state.in_slice_zone);
        assert_ne!(state.color_mod, Vec3::ONE);
    }
}

#[test]
fn slice_kind_leaves_color_and_duplicates_alone() {
    let generator = at_full_intensity(GlitchConfig {
        seed: Some(21),
        kind: GlitchKind::Slice,
        slice_height: 1.0,
        duplication_chance: 1.0,
        random_corruption: false,
        ..GlitchConfig::default()
    });

    for index in 0..12 {
        let state = generator.get_character_state(index, 12);
        assert_eq!(state.color_mod, Vec3::ONE);
        assert!(!state.duplicate);
        assert!(state.in_slice_zone);
        assert_eq!(state.offset.x, state.slice_offset);
        assert_eq!(state.offset.y, 0.0);
    }
}
