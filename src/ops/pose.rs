// ============================================================================
// POSE ENGINE — per-object position / uniform scale / rotation, plus the
// gesture session state machine that drives it
// ============================================================================

use egui::{Pos2, Vec2};

/// Two pinch contacts closer than this (in surface units) are treated as
/// coincident: distance ratios and angles computed from them are meaningless.
const MIN_PINCH_DISTANCE: f32 = 1e-3;

// ---------------------------------------------------------------------------
//  Pose
// ---------------------------------------------------------------------------

/// The 2D pose of one placed object. `pos` is the object's pivot (its center)
/// in drop-surface coordinates. Scale is uniform; rotation is in degrees and
/// may run outside `[0, 360)` during a continuous gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub pos: Pos2,
    pub scale: f32,
    pub rotation_deg: f32,
}

impl Default for Pose {
    fn default() -> Self {
        Self { pos: Pos2::ZERO, scale: 1.0, rotation_deg: 0.0 }
    }
}

impl Pose {
    pub fn at(pos: Pos2) -> Self {
        Self { pos, ..Self::default() }
    }
}

/// Uniform-scale bounds. Kept as data, not constants: source material for
/// this app disagrees on the "right" bounds, so they are configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleLimits {
    pub min: f32,
    pub max: f32,
}

impl Default for ScaleLimits {
    fn default() -> Self {
        Self { min: 0.5, max: 3.0 }
    }
}

/// Map any angle in degrees into `[0, 360)`.
pub fn normalize_degrees(deg: f32) -> f32 {
    deg.rem_euclid(360.0)
}

/// Discrete rotation step (button press). The result is normalized; the
/// running gesture path deliberately is not.
pub fn apply_rotation_step(pose: &mut Pose, step_deg: f32) {
    pose.rotation_deg = normalize_degrees(pose.rotation_deg + step_deg);
}

/// Discrete scale step (button press). Multiply first, clamp after — clamping
/// the input instead would let the scale run past the bound on the step that
/// crosses it.
pub fn apply_scale_step(pose: &mut Pose, factor: f32, limits: ScaleLimits) {
    if !factor.is_finite() || factor <= 0.0 {
        return;
    }
    pose.scale = (pose.scale * factor).clamp(limits.min, limits.max);
}

// ---------------------------------------------------------------------------
//  Composed transform
// ---------------------------------------------------------------------------

/// Row-major 2×3 affine matrix: `x' = m[0]x + m[1]y + m[2]`,
/// `y' = m[3]x + m[4]y + m[5]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2D {
    pub m: [f32; 6],
}

impl Transform2D {
    pub fn apply(&self, p: Pos2) -> Pos2 {
        Pos2::new(
            self.m[0] * p.x + self.m[1] * p.y + self.m[2],
            self.m[3] * p.x + self.m[4] * p.y + self.m[5],
        )
    }

    /// Inverse transform, or `None` when the matrix is singular (scale 0).
    pub fn inverse(&self) -> Option<Transform2D> {
        let det = self.m[0] * self.m[4] - self.m[1] * self.m[3];
        if det.abs() < f32::EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let a = self.m[4] * inv_det;
        let b = -self.m[1] * inv_det;
        let d = -self.m[3] * inv_det;
        let e = self.m[0] * inv_det;
        Some(Transform2D {
            m: [
                a,
                b,
                -(a * self.m[2] + b * self.m[5]),
                d,
                e,
                -(d * self.m[2] + e * self.m[5]),
            ],
        })
    }
}

/// The `(left, top, rotation, scale)` tuple handed to the paint sink.
/// `left`/`top` place the unscaled image so that its center sits on the
/// pivot; the renderer applies rotation and scale about that center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleTransform {
    pub left: f32,
    pub top: f32,
    pub rotation_deg: f32,
    pub scale: f32,
}

/// Compose the pose into `translate(pivot) ∘ scale ∘ rotate`, i.e. a point in
/// object-local coordinates (origin at the pivot) is rotated, then scaled,
/// then moved to the pivot. Rotation and scale both originate at the object's
/// own center, never at the surface origin.
pub fn compose_transform(pose: &Pose) -> Transform2D {
    let (sin, cos) = pose.rotation_deg.to_radians().sin_cos();
    let s = pose.scale;
    Transform2D {
        m: [
            s * cos, -s * sin, pose.pos.x,
            s * sin, s * cos, pose.pos.y,
        ],
    }
}

/// Pose → style tuple for an image of unscaled pixel size `size`.
pub fn style_transform(pose: &Pose, size: Vec2) -> StyleTransform {
    StyleTransform {
        left: pose.pos.x - size.x * 0.5,
        top: pose.pos.y - size.y * 0.5,
        rotation_deg: pose.rotation_deg,
        scale: pose.scale,
    }
}

// ---------------------------------------------------------------------------
//  Gesture session
// ---------------------------------------------------------------------------

/// One continuous interaction with an object. All anchors are captured once
/// when the gesture (or its current mode) begins; per-frame updates are
/// computed against them rather than accumulated, so small per-frame errors
/// cannot drift.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    /// Single contact: translate only. `pointer_offset` is the fixed vector
    /// from the contact to the pivot so the object never jumps under the
    /// finger.
    Drag { pointer_offset: Vec2 },
    /// Two contacts: pinch to scale, twist to rotate, midpoint to move.
    PinchRotate {
        start_distance: f32,
        start_angle_deg: f32,
        start_scale: f32,
        start_rotation_deg: f32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureSession {
    pub gesture: Gesture,
}

impl GestureSession {
    /// Number of contacts this session's mode consumes.
    pub fn contact_count(&self) -> usize {
        match self.gesture {
            Gesture::Drag { .. } => 1,
            Gesture::PinchRotate { .. } => 2,
        }
    }
}

fn contact_distance(a: Pos2, b: Pos2) -> f32 {
    (b - a).length()
}

fn contact_angle_deg(a: Pos2, b: Pos2) -> f32 {
    let d = b - a;
    d.y.atan2(d.x).to_degrees()
}

fn contact_midpoint(a: Pos2, b: Pos2) -> Pos2 {
    Pos2::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
}

/// Start a gesture against the current pose. One contact begins a drag, two
/// (or more — extras are ignored) begin a pinch-rotate, zero begins nothing.
pub fn begin_gesture(pose: &Pose, contacts: &[Pos2]) -> Option<GestureSession> {
    match contacts {
        [] => None,
        [c] => Some(GestureSession {
            gesture: Gesture::Drag { pointer_offset: *c - pose.pos },
        }),
        [a, b, ..] => Some(GestureSession {
            gesture: Gesture::PinchRotate {
                start_distance: contact_distance(*a, *b),
                start_angle_deg: contact_angle_deg(*a, *b),
                start_scale: pose.scale,
                start_rotation_deg: pose.rotation_deg,
            },
        }),
    }
}

/// Per-frame gesture update. If the contact count no longer matches the
/// session's mode (a finger landed or lifted), the session is restarted from
/// the current contacts first — a 2→1 downgrade recaptures the drag offset
/// from the surviving contact instead of carrying a stale pinch anchor.
///
/// Degenerate pinch geometry (coincident contacts at gesture start or on the
/// current frame) skips the scale/rotation update for that frame; the
/// session itself survives.
pub fn update_gesture(
    session: &mut GestureSession,
    pose: &mut Pose,
    contacts: &[Pos2],
    limits: ScaleLimits,
) {
    if contacts.is_empty() {
        return;
    }
    let expected = session.contact_count();
    let available = contacts.len().min(2);
    if available != expected {
        if let Some(restarted) = begin_gesture(pose, contacts) {
            *session = restarted;
        }
    }

    match session.gesture {
        Gesture::Drag { pointer_offset } => {
            pose.pos = contacts[0] - pointer_offset;
        }
        Gesture::PinchRotate {
            start_distance,
            start_angle_deg,
            start_scale,
            start_rotation_deg,
        } => {
            let (a, b) = (contacts[0], contacts[1]);
            let distance = contact_distance(a, b);
            if start_distance > MIN_PINCH_DISTANCE && distance > MIN_PINCH_DISTANCE {
                pose.scale = (start_scale * distance / start_distance)
                    .clamp(limits.min, limits.max);
                pose.rotation_deg =
                    start_rotation_deg + (contact_angle_deg(a, b) - start_angle_deg);
            }
            pose.pos = contact_midpoint(a, b);
        }
    }
}

/// Finish a gesture. When `snap_deg` is configured, rotation is rounded to
/// the nearest multiple and normalized; otherwise only normalization happens
/// so the stored rotation re-enters `[0, 360)` after a long twist.
pub fn end_gesture(pose: &mut Pose, snap_deg: Option<f32>) {
    if let Some(snap) = snap_deg
        && snap > 0.0
    {
        pose.rotation_deg = (pose.rotation_deg / snap).round() * snap;
    }
    pose.rotation_deg = normalize_degrees(pose.rotation_deg);
}
