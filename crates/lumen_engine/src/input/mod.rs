//! Keyboard input driving the scene camera
//!
//! Keys map to [`CameraAction`]s through [`KeyBindings`]. Each press steps the
//! accumulated [`CameraInput`] and clamps it, so the orbit angle and zoom
//! distance always stay inside the configured range.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::core::config::InputConfig;

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    /// A key
    A,
    /// D key
    D,
    /// E key
    E,
    /// Q key
    Q,
    /// S key
    S,
    /// W key
    W,
    /// Space key
    Space,
    /// Escape key
    Escape,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

/// What a bound key does to the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraAction {
    /// Orbit counter-clockwise around the vertical axis
    RotateLeft,
    /// Orbit clockwise around the vertical axis
    RotateRight,
    /// Move towards the look target
    ZoomIn,
    /// Move away from the look target
    ZoomOut,
}

/// Key to action table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    bindings: HashMap<KeyCode, CameraAction>,
}

impl KeyBindings {
    /// Table with no bindings
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Bind `key` to `action`, replacing any previous binding of `key`
    pub fn bind(&mut self, key: KeyCode, action: CameraAction) -> &mut Self {
        self.bindings.insert(key, action);
        self
    }

    /// Remove the binding of `key`
    pub fn unbind(&mut self, key: KeyCode) -> Option<CameraAction> {
        self.bindings.remove(&key)
    }

    /// Action bound to `key`
    pub fn action_for(&self, key: KeyCode) -> Option<CameraAction> {
        self.bindings.get(&key).copied()
    }
}

impl Default for KeyBindings {
    /// A/D rotate, W/S zoom
    fn default() -> Self {
        let mut bindings = Self::empty();
        bindings
            .bind(KeyCode::A, CameraAction::RotateLeft)
            .bind(KeyCode::D, CameraAction::RotateRight)
            .bind(KeyCode::W, CameraAction::ZoomIn)
            .bind(KeyCode::S, CameraAction::ZoomOut);
        bindings
    }
}

/// Accumulated camera rotation (radians about Y) and zoom offset
#[derive(Debug, Clone, PartialEq)]
pub struct CameraInput {
    limits: InputConfig,
    rotation: f32,
    zoom: f32,
}

impl CameraInput {
    /// Start at zero rotation and zoom with the given step sizes and limits
    pub fn new(limits: InputConfig) -> Self {
        Self {
            limits,
            rotation: 0.0,
            zoom: 0.0,
        }
    }

    /// Current rotation in radians
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Current zoom offset along the view axis
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Step sizes and limits in use
    pub fn limits(&self) -> &InputConfig {
        &self.limits
    }

    /// Step once in the direction of `action`, then clamp
    pub fn apply(&mut self, action: CameraAction) {
        let limits = &self.limits;
        match action {
            CameraAction::RotateLeft => self.rotation += limits.rotation_step,
            CameraAction::RotateRight => self.rotation -= limits.rotation_step,
            CameraAction::ZoomIn => self.zoom += limits.zoom_step,
            CameraAction::ZoomOut => self.zoom -= limits.zoom_step,
        }

        self.rotation = self.rotation.clamp(-limits.max_rotation, limits.max_rotation);
        self.zoom = self.zoom.clamp(limits.min_zoom, limits.max_zoom);
        log::trace!("Camera input: rotation {:.4}, zoom {:.2}", self.rotation, self.zoom);
    }

    /// Back to zero rotation and zoom
    pub fn reset(&mut self) {
        self.rotation = 0.0;
        self.zoom = 0.0;
    }
}

impl Default for CameraInput {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

/// Input manager
#[derive(Debug, Clone, Default)]
pub struct InputManager {
    bindings: KeyBindings,
    pressed: HashSet<KeyCode>,
    camera: CameraInput,
}

impl InputManager {
    /// Create an input manager
    pub fn new(bindings: KeyBindings, camera: CameraInput) -> Self {
        Self {
            bindings,
            pressed: HashSet::new(),
            camera,
        }
    }

    /// Handle key input. A press (or key repeat) of a bound key steps the
    /// camera once; releases only update the pressed set.
    pub fn handle_key_input(&mut self, key: KeyCode, pressed: bool) {
        if !pressed {
            self.pressed.remove(&key);
            return;
        }

        self.pressed.insert(key);
        if let Some(action) = self.bindings.action_for(key) {
            self.camera.apply(action);
        }
    }

    /// Whether `key` is currently held
    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// Accumulated camera input
    pub fn camera(&self) -> &CameraInput {
        &self.camera
    }

    /// Key bindings, editable at runtime
    pub fn bindings_mut(&mut self) -> &mut KeyBindings {
        &mut self.bindings
    }
}
