//! Rendering interfaces.
//!
//! The simulation never draws. A client implements [`Renderer`] and
//! [`AssetLoader`] for its backend and calls [`render_snapshot`] with the
//! latest [`Snapshot`]. Every snapshot entity implements [`Drawable`], which
//! maps it to a sprite and the rectangles to copy from and to.

use crate::components::Faction;
use crate::error::Result;
use crate::world::{
    BeamSnapshot, ExplosionSnapshot, RocketSnapshot, SmokeSnapshot, Snapshot, TankSnapshot,
};
use glam::Vec2;
use std::collections::HashMap;

/// Which texture an entity is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    Background,
    BlueTank,
    RedTank,
    BlueRocket,
    RedRocket,
    Smoke,
    Explosion,
    Beam,
}

impl SpriteKind {
    pub const ALL: [SpriteKind; 8] = [
        SpriteKind::Background,
        SpriteKind::BlueTank,
        SpriteKind::RedTank,
        SpriteKind::BlueRocket,
        SpriteKind::RedRocket,
        SpriteKind::Smoke,
        SpriteKind::Explosion,
        SpriteKind::Beam,
    ];

    /// Asset path, relative to the client's asset root.
    pub fn asset_path(self) -> &'static str {
        match self {
            SpriteKind::Background => "assets/background.bmp",
            SpriteKind::BlueTank => "assets/tank_blue.bmp",
            SpriteKind::RedTank => "assets/tank_red.bmp",
            SpriteKind::BlueRocket => "assets/rocket_blue.bmp",
            SpriteKind::RedRocket => "assets/rocket_red.bmp",
            SpriteKind::Smoke => "assets/smoke.bmp",
            SpriteKind::Explosion => "assets/explosion.bmp",
            SpriteKind::Beam => "assets/particle_beam.bmp",
        }
    }

    fn tank(faction: Faction) -> Self {
        match faction {
            Faction::Blue => SpriteKind::BlueTank,
            Faction::Red => SpriteKind::RedTank,
        }
    }

    fn rocket(faction: Faction) -> Self {
        match faction {
            Faction::Blue => SpriteKind::BlueRocket,
            Faction::Red => SpriteKind::RedRocket,
        }
    }
}

/// Opaque handle issued by an [`AssetLoader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Integer pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl SpriteRect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Square of side `2 * radius` centered on `center`.
    pub fn centered(center: Vec2, radius: f32) -> Self {
        let side = (radius * 2.0) as i32;
        Self::new((center.x - radius) as i32, (center.y - radius) as i32, side, side)
    }
}

/// Something that can be put on screen.
pub trait Drawable {
    fn sprite(&self) -> SpriteKind;

    fn position(&self) -> Vec2;

    /// Animation frame of the sprite sheet (0 for static sprites).
    fn frame(&self) -> u32 {
        0
    }

    /// Part of the texture to copy; None copies the whole texture.
    fn source_rect(&self) -> Option<SpriteRect> {
        None
    }

    fn dest_rect(&self) -> SpriteRect;
}

impl Drawable for TankSnapshot {
    fn sprite(&self) -> SpriteKind {
        SpriteKind::tank(self.faction)
    }

    fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    fn dest_rect(&self) -> SpriteRect {
        SpriteRect::centered(self.position(), self.radius)
    }
}

impl Drawable for RocketSnapshot {
    fn sprite(&self) -> SpriteKind {
        SpriteKind::rocket(self.faction)
    }

    fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    fn dest_rect(&self) -> SpriteRect {
        SpriteRect::centered(self.position(), self.radius)
    }
}

impl Drawable for SmokeSnapshot {
    fn sprite(&self) -> SpriteKind {
        SpriteKind::Smoke
    }

    fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Four frames, 15 ticks each.
    fn frame(&self) -> u32 {
        self.frame / 15
    }

    fn dest_rect(&self) -> SpriteRect {
        SpriteRect::new(self.x as i32, self.y as i32, 32, 32)
    }
}

impl Drawable for ExplosionSnapshot {
    fn sprite(&self) -> SpriteKind {
        SpriteKind::Explosion
    }

    fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    fn frame(&self) -> u32 {
        self.frame / 2
    }

    fn source_rect(&self) -> Option<SpriteRect> {
        Some(SpriteRect::new(0, 0, 32, 32))
    }

    fn dest_rect(&self) -> SpriteRect {
        SpriteRect::new(self.x as i32, self.y as i32, 24, 24)
    }
}

/// Beam sprites are drawn up and left of the beam rectangle.
const BEAM_SPRITE_OFFSET: (f32, f32) = (23.0, 137.0);

impl Drawable for BeamSnapshot {
    fn sprite(&self) -> SpriteKind {
        SpriteKind::Beam
    }

    fn position(&self) -> Vec2 {
        Vec2::new(self.min_x, self.min_y)
    }

    fn frame(&self) -> u32 {
        self.frame / 10
    }

    fn source_rect(&self) -> Option<SpriteRect> {
        Some(SpriteRect::new(0, 0, 14, 18))
    }

    fn dest_rect(&self) -> SpriteRect {
        SpriteRect::new(
            (self.min_x - BEAM_SPRITE_OFFSET.0) as i32,
            (self.min_y - BEAM_SPRITE_OFFSET.1) as i32,
            24,
            24,
        )
    }
}

/// Backend that copies texture regions to the screen.
pub trait Renderer {
    /// Copy `source` of `texture` to `dest`. None means the whole texture
    /// or the whole screen.
    fn draw(
        &mut self,
        texture: TextureHandle,
        source: Option<SpriteRect>,
        dest: Option<SpriteRect>,
    );
}

/// Backend that turns asset paths into textures.
pub trait AssetLoader {
    fn load_texture(&mut self, path: &str) -> Result<TextureHandle>;
}

/// One loaded texture per [`SpriteKind`].
#[derive(Debug, Clone)]
pub struct TextureSet {
    textures: HashMap<SpriteKind, TextureHandle>,
}

impl TextureSet {
    /// Load every sprite. Fails on the first texture the loader rejects.
    pub fn load(loader: &mut impl AssetLoader) -> Result<Self> {
        let mut textures = HashMap::with_capacity(SpriteKind::ALL.len());
        for kind in SpriteKind::ALL {
            textures.insert(kind, loader.load_texture(kind.asset_path())?);
        }
        Ok(Self { textures })
    }

    pub fn get(&self, kind: SpriteKind) -> Option<TextureHandle> {
        self.textures.get(&kind).copied()
    }
}

fn draw_one(item: &impl Drawable, textures: &TextureSet, renderer: &mut impl Renderer) {
    if let Some(texture) = textures.get(item.sprite()) {
        renderer.draw(texture, item.source_rect(), Some(item.dest_rect()));
    }
}

/// Draw a snapshot: background, tanks, rockets, smoke, beams, explosions.
/// Destroyed tanks are not drawn.
pub fn render_snapshot(snapshot: &Snapshot, textures: &TextureSet, renderer: &mut impl Renderer) {
    if let Some(background) = textures.get(SpriteKind::Background) {
        renderer.draw(background, None, None);
    }
    for tank in snapshot.tanks.iter().filter(|t| t.active) {
        draw_one(tank, textures, renderer);
    }
    for rocket in &snapshot.rockets {
        draw_one(rocket, textures, renderer);
    }
    for smoke in &snapshot.smoke {
        draw_one(smoke, textures, renderer);
    }
    for beam in &snapshot.beams {
        draw_one(beam, textures, renderer);
    }
    for explosion in &snapshot.explosions {
        draw_one(explosion, textures, renderer);
    }
}
