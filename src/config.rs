// Static tuning tables for the surprise-box scene.
//
// Everything here is fixed at compile time and handed to the controller by
// `&'static` reference; there is no mutable configuration state anywhere in
// the crate.

/// Convert a `0xRRGGBB` color to linear-ish normalized RGB.
pub const fn rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

pub struct CameraTable {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
}

pub struct LightTable {
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    pub directional_color: [f32; 3],
    pub directional_intensity: f32,
    pub directional_position: [f32; 3],
}

pub struct LidTable {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    /// Y offset of the hinge line above the body center.
    pub offset_y: f32,
}

pub struct BoxTable {
    pub body: [f32; 3],
    pub lid: LidTable,
    pub body_color: [f32; 3],
    pub lid_color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
}

pub struct AnimationTable {
    /// Ambient yaw increment, radians per frame. Applied in every state.
    pub rotation_speed: f32,
    /// Max lid step, radians per frame.
    pub lid_open_speed: f32,
    /// Target lid angle once the box is opening (negative = backwards).
    pub lid_open_angle: f32,
    /// Interpolation factor toward the lid target each frame.
    pub lid_blend_factor: f32,
}

pub struct ParticleTable {
    /// Spawn invocations per open sequence.
    pub burst_count: u32,
    pub spawn_interval_ms: i32,
    /// One-shot delay between the click and the first spawn tick.
    pub open_delay_ms: i32,
    /// Units per frame squared, subtracted from velocity.y.
    pub gravity: f32,
    /// Initial velocity.x drawn from [-half_x, half_x].
    pub velocity_half_x: f32,
    /// Initial velocity.y drawn from [0, max_y].
    pub velocity_max_y: f32,
    /// Initial velocity.z drawn from [-half_z, half_z].
    pub velocity_half_z: f32,
    /// Per-frame local rotation increments around X and Y.
    pub rotation_step: [f32; 2],
    /// Horizontal spawn jitter around the box position, per axis.
    pub spawn_jitter: f32,
    /// Particles are pruned the frame their Y drops below this.
    pub despawn_y: f32,
    pub text_size: f32,
    pub text_depth: f32,
}

pub struct SceneConfig {
    pub camera: CameraTable,
    pub lights: LightTable,
    pub box_mesh: BoxTable,
    pub animation: AnimationTable,
    pub particles: ParticleTable,
    pub snippets: &'static [&'static str],
    pub palette: &'static [[f32; 3]],
}

/// Path of the typeface asset, resolved against the page origin.
pub const TYPEFACE_URL: &str = "/fonts/helvetiker_regular.typeface.json";

pub static SCENE: SceneConfig = SceneConfig {
    camera: CameraTable {
        fov_degrees: 75.0,
        near: 0.1,
        far: 1000.0,
        position: [0.0, 0.0, 5.0],
    },
    lights: LightTable {
        ambient_color: rgb(0xffffff),
        ambient_intensity: 0.5,
        directional_color: rgb(0xffffff),
        directional_intensity: 1.0,
        directional_position: [2.0, 2.0, 2.0],
    },
    box_mesh: BoxTable {
        body: [1.0, 1.0, 1.0],
        lid: LidTable {
            width: 1.1,
            height: 0.1,
            depth: 1.1,
            offset_y: 0.5,
        },
        body_color: rgb(0xff4444),
        lid_color: rgb(0xdd3333),
        metalness: 0.5,
        roughness: 0.1,
    },
    animation: AnimationTable {
        rotation_speed: 0.01,
        lid_open_speed: 0.05,
        lid_open_angle: -0.8 * std::f32::consts::PI,
        lid_blend_factor: 0.1,
    },
    particles: ParticleTable {
        burst_count: 20,
        spawn_interval_ms: 100,
        open_delay_ms: 300,
        gravity: 0.005,
        velocity_half_x: 0.05,
        velocity_max_y: 0.2,
        velocity_half_z: 0.05,
        rotation_step: [0.02, 0.01],
        spawn_jitter: 0.25,
        despawn_y: -5.0,
        text_size: 0.15,
        text_depth: 0.03,
    },
    snippets: &[
        "const", "let", "function", "class", "return", "if", "for", "while", "switch", "async",
        "await", "Promise", "try", "catch", "throw", "=>", "...args", "?.", "??", "{}", "[]",
        "<>", "===", "!==", "&&", "||", "//", "/* */",
    ],
    palette: &[
        rgb(0x61dafb), // React blue
        rgb(0x764abc), // Redux purple
        rgb(0x2c8ebb), // Sass-less blue
        rgb(0xf1502f), // Git red
        rgb(0x61dbfb), // lighter cyan
        rgb(0x41b883), // Vue green
        rgb(0xe34c26), // HTML orange
        rgb(0x563d7c), // Bootstrap purple
        rgb(0xf7df1e), // JavaScript yellow
        rgb(0x3178c6), // TypeScript blue
    ],
};
