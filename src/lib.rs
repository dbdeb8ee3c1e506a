pub mod animation;
pub mod char_effect;
pub mod easing;
pub mod glitch;
pub mod glitch_config;
pub mod math;
pub mod noise;
pub mod text_renderer;
