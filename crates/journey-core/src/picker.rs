//! Pointer picking over a flat interactable registry.
//!
//! Records live in an arena keyed by [`InteractableId`]. Each record owns a
//! root pick node; sub-parts hang off it through parent links, so a hit on
//! any part resolves to the record by walking up to the root.

use bevy_math::{Ray3d, Vec2, Vec3};

use crate::camera::CameraRig;
use crate::scene::{BodySpec, Category, VisualState};

/// Hover emissive colour (#f97316) in linear RGB.
pub const HOVER_EMISSIVE: [f32; 3] = [0.947, 0.172, 0.008];
pub const HOVER_INTENSITY_BOOST: f32 = 0.9;
pub const HOVER_INTENSITY_MAX: f32 = 2.5;
pub const HOVER_SCALE: f32 = 1.02;
/// Tooltip offset from the pointer, in pixels.
pub const TOOLTIP_OFFSET: f32 = 14.0;
/// Minimum tooltip distance from the surface edge, in pixels.
pub const TOOLTIP_MARGIN: f32 = 20.0;

/// Stable handle of a registered interactable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InteractableId(pub u32);

/// Handle of a pick node (a record root or one of its parts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// A registered interactable.
#[derive(Debug, Clone, PartialEq)]
pub struct Interactable {
    pub id: InteractableId,
    pub display_name: String,
    pub description: String,
    pub category: Category,
    pub world_position: Vec3,
    pub bounding_radius: f32,
    pub visible: bool,
    pub removed: bool,
    pub hovered: bool,
    pub root: NodeId,
    /// Look at registration time.
    pub base_visual: VisualState,
    /// Look captured at first hover; never overwritten.
    pub original_visual: Option<VisualState>,
    /// Look to render now.
    pub visual: VisualState,
}

impl Interactable {
    fn is_pickable(&self) -> bool {
        self.visible && !self.removed
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PickNode {
    parent: Option<NodeId>,
    /// Set only on record roots.
    root_of: Option<InteractableId>,
    offset: Vec3,
    radius: f32,
}

/// Hover change notice for the tooltip and material sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverChanged {
    pub entered: Option<InteractableId>,
    pub left: Option<InteractableId>,
}

/// The drawing surface in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left
            && point.x <= self.left + self.width
            && point.y >= self.top
            && point.y <= self.top + self.height
    }

    /// Normalized device coordinates, or `None` outside the surface.
    pub fn to_ndc(&self, point: Vec2) -> Option<Vec2> {
        if self.width <= 0.0 || self.height <= 0.0 || !point.is_finite() || !self.contains(point) {
            return None;
        }
        Some(Vec2::new(
            (point.x - self.left) / self.width * 2.0 - 1.0,
            -((point.y - self.top) / self.height * 2.0 - 1.0),
        ))
    }

    /// Tooltip position for a pointer, kept inside the surface.
    pub fn tooltip_position(&self, pointer: Vec2) -> Vec2 {
        Vec2::new(
            (pointer.x + TOOLTIP_OFFSET).min(self.left + self.width - TOOLTIP_MARGIN),
            (pointer.y + TOOLTIP_OFFSET).min(self.top + self.height - TOOLTIP_MARGIN),
        )
    }
}

impl Default for SurfaceRect {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Distance along `ray` to the nearest intersection with a sphere.
pub fn ray_sphere_distance(ray: &Ray3d, center: Vec3, radius: f32) -> Option<f32> {
    if radius <= 0.0 {
        return None;
    }
    let dir: Vec3 = *ray.direction;
    let oc = ray.origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt = disc.sqrt();
    let near = -b - sqrt;
    let far = -b + sqrt;
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        // Origin inside the sphere
        Some(0.0)
    } else {
        None
    }
}

/// Registry plus single-hover state.
#[derive(Debug, Clone, Default)]
pub struct InteractionPicker {
    records: Vec<Interactable>,
    nodes: Vec<PickNode>,
    hovered: Option<InteractableId>,
    pointer: Option<Vec2>,
}

impl InteractionPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a body and its parts.
    pub fn register(&mut self, body: &BodySpec) -> InteractableId {
        let id = InteractableId(self.records.len() as u32);
        let root = self.push_node(PickNode {
            parent: None,
            root_of: Some(id),
            offset: Vec3::ZERO,
            radius: body.pick_radius,
        });
        for part in &body.parts {
            self.push_node(PickNode {
                parent: Some(root),
                root_of: None,
                offset: part.offset,
                radius: part.radius,
            });
        }

        self.records.push(Interactable {
            id,
            display_name: body.name.clone(),
            description: body.description.to_string(),
            category: body.category,
            world_position: body.position,
            bounding_radius: body.bounding_radius,
            visible: true,
            removed: false,
            hovered: false,
            root,
            base_visual: body.visual,
            original_visual: None,
            visual: body.visual,
        });
        id
    }

    /// Adds a pickable part below `parent`.
    pub fn add_part(&mut self, parent: NodeId, offset: Vec3, radius: f32) -> Option<NodeId> {
        if parent.0 as usize >= self.nodes.len() {
            return None;
        }
        Some(self.push_node(PickNode {
            parent: Some(parent),
            root_of: None,
            offset,
            radius,
        }))
    }

    fn push_node(&mut self, node: PickNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: InteractableId) -> Option<&Interactable> {
        self.records.get(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interactable> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn hovered(&self) -> Option<InteractableId> {
        self.hovered
    }

    pub fn hovered_record(&self) -> Option<&Interactable> {
        self.hovered.and_then(|id| self.get(id))
    }

    /// Last pointer position seen over the surface.
    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    /// Walks up from `node` to the record that owns it.
    pub fn owner_of(&self, node: NodeId) -> Option<InteractableId> {
        let mut current = Some(node);
        // Bounded by the node count so a malformed chain cannot spin.
        for _ in 0..=self.nodes.len() {
            let id = current?;
            let n = self.nodes.get(id.0 as usize)?;
            if let Some(record) = n.root_of {
                return Some(record);
            }
            current = n.parent;
        }
        None
    }

    /// World-space centre of a node.
    fn node_center(&self, node: NodeId, owner: &Interactable) -> Vec3 {
        let mut offset = Vec3::ZERO;
        let mut current = Some(node);
        for _ in 0..=self.nodes.len() {
            let Some(id) = current else { break };
            let Some(n) = self.nodes.get(id.0 as usize) else { break };
            offset += n.offset;
            if n.root_of.is_some() {
                break;
            }
            current = n.parent;
        }
        owner.world_position + offset
    }

    pub fn set_world_position(&mut self, id: InteractableId, position: Vec3) {
        if let Some(record) = self.records.get_mut(id.0 as usize) {
            record.world_position = position;
        }
    }

    /// Shows or hides a record. Hiding the hovered record clears the hover.
    pub fn set_visible(&mut self, id: InteractableId, visible: bool) -> Option<HoverChanged> {
        let record = self.records.get_mut(id.0 as usize)?;
        record.visible = visible;
        if !visible && self.hovered == Some(id) {
            return self.set_hover(None);
        }
        None
    }

    /// Removes a record from picking for good.
    pub fn remove(&mut self, id: InteractableId) -> Option<HoverChanged> {
        let record = self.records.get_mut(id.0 as usize)?;
        record.removed = true;
        if self.hovered == Some(id) {
            return self.set_hover(None);
        }
        None
    }

    /// Nearest visible record hit by `ray`.
    pub fn pick(&self, ray: &Ray3d) -> Option<InteractableId> {
        let mut best: Option<(f32, NodeId)> = None;

        for (index, node) in self.nodes.iter().enumerate() {
            let node_id = NodeId(index as u32);
            let Some(owner_id) = self.owner_of(node_id) else { continue };
            let Some(owner) = self.get(owner_id) else { continue };
            if !owner.is_pickable() {
                continue;
            }

            let center = self.node_center(node_id, owner);
            if let Some(t) = ray_sphere_distance(ray, center, node.radius) {
                if best.map_or(true, |(d, _)| t < d) {
                    best = Some((t, node_id));
                }
            }
        }

        best.and_then(|(_, node)| self.owner_of(node))
    }

    /// Re-evaluates the hover for a pointer position in window coordinates.
    pub fn update_from_pointer(
        &mut self,
        pointer: Vec2,
        surface: &SurfaceRect,
        rig: &CameraRig,
    ) -> Option<HoverChanged> {
        let Some(ndc) = surface.to_ndc(pointer) else {
            self.pointer = None;
            return self.set_hover(None);
        };
        self.pointer = Some(pointer);

        let hit = rig
            .ray_through(ndc, surface.aspect())
            .and_then(|ray| self.pick(&ray));
        self.set_hover(hit)
    }

    /// Clears the hover when the pointer leaves the surface.
    pub fn pointer_left(&mut self) -> Option<HoverChanged> {
        self.pointer = None;
        self.set_hover(None)
    }

    /// Focuses the camera on the hovered record, if any.
    pub fn on_click(&self, rig: &mut CameraRig, now: f64) -> Option<InteractableId> {
        let record = self.hovered_record()?;
        tracing::info!("Focusing on {}", record.display_name);
        rig.focus_on(record.world_position, record.bounding_radius, now);
        Some(record.id)
    }

    /// Moves the single hover to `next`, restoring the previous record once.
    pub fn set_hover(&mut self, next: Option<InteractableId>) -> Option<HoverChanged> {
        if self.hovered == next {
            return None;
        }
        let previous = self.hovered.take();

        if let Some(prev) = previous.and_then(|id| self.records.get_mut(id.0 as usize)) {
            prev.hovered = false;
            prev.visual = prev.original_visual.unwrap_or(prev.base_visual);
        }

        if let Some(record) = next.and_then(|id| self.records.get_mut(id.0 as usize)) {
            let original = *record.original_visual.get_or_insert(record.visual);
            record.hovered = true;
            record.visual = hover_emphasis(original);
            self.hovered = Some(record.id);
        }

        Some(HoverChanged {
            entered: self.hovered,
            left: previous,
        })
    }
}

/// The hovered look derived from a record's original look.
pub fn hover_emphasis(original: VisualState) -> VisualState {
    VisualState {
        emissive: HOVER_EMISSIVE,
        emissive_intensity: (original.emissive_intensity + HOVER_INTENSITY_BOOST).min(HOVER_INTENSITY_MAX),
        scale: original.scale * HOVER_SCALE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::scene::{default_catalog, BodyKind, PartSpec};
    use bevy_math::Dir3;

    fn ray(origin: Vec3, direction: Vec3) -> Ray3d {
        Ray3d {
            origin,
            direction: Dir3::new(direction).unwrap(),
        }
    }

    fn sphere(name: &str, position: Vec3, radius: f32) -> BodySpec {
        BodySpec {
            kind: BodyKind::Mars,
            name: name.to_string(),
            description: "test body",
            category: Category::Planet,
            position,
            bounding_radius: radius,
            pick_radius: radius,
            parts: Vec::new(),
            visual: VisualState::glowing([0.1, 0.2, 0.3], 0.5),
            orbit: None,
        }
    }

    /// A rig at the origin looking down -Z.
    fn rig_looking_down_z() -> CameraRig {
        let config = CameraConfig {
            initial_position: [0.0, 0.0, 0.0],
            ..Default::default()
        };
        let mut rig = CameraRig::new(&config);
        rig.set_focus_target(Vec3::new(0.0, 0.0, -100.0));
        rig
    }

    fn center(surface: &SurfaceRect) -> Vec2 {
        Vec2::new(surface.width / 2.0, surface.height / 2.0)
    }

    #[test]
    fn test_ndc_conversion() {
        let surface = SurfaceRect::new(800.0, 600.0);
        assert_eq!(surface.to_ndc(Vec2::new(400.0, 300.0)), Some(Vec2::ZERO));
        assert_eq!(surface.to_ndc(Vec2::new(0.0, 0.0)), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(surface.to_ndc(Vec2::new(800.0, 600.0)), Some(Vec2::new(1.0, -1.0)));
        assert_eq!(surface.to_ndc(Vec2::new(-1.0, 10.0)), None);
        assert_eq!(surface.to_ndc(Vec2::new(f32::NAN, 10.0)), None);
    }

    #[test]
    fn test_tooltip_clamped_to_surface() {
        let surface = SurfaceRect::new(800.0, 600.0);
        assert_eq!(surface.tooltip_position(Vec2::new(100.0, 100.0)), Vec2::new(114.0, 114.0));
        assert_eq!(surface.tooltip_position(Vec2::new(790.0, 595.0)), Vec2::new(780.0, 580.0));
    }

    #[test]
    fn test_ray_sphere_distance() {
        let ray = ray(Vec3::ZERO, Vec3::NEG_Z);
        assert_eq!(ray_sphere_distance(&ray, Vec3::new(0.0, 0.0, -10.0), 2.0), Some(8.0));
        assert_eq!(ray_sphere_distance(&ray, Vec3::new(0.0, 5.0, -10.0), 2.0), None);
        assert_eq!(ray_sphere_distance(&ray, Vec3::new(0.0, 0.0, 10.0), 2.0), None);
        assert_eq!(ray_sphere_distance(&ray, Vec3::ZERO, 2.0), Some(0.0));
        assert_eq!(ray_sphere_distance(&ray, Vec3::new(0.0, 0.0, -10.0), 0.0), None);
    }

    #[test]
    fn test_nearest_hit_wins() {
        let mut picker = InteractionPicker::new();
        let far = picker.register(&sphere("far", Vec3::new(0.0, 0.0, -300.0), 30.0));
        let near = picker.register(&sphere("near", Vec3::new(0.0, 0.0, -100.0), 10.0));

        let surface = SurfaceRect::new(800.0, 600.0);
        let rig = rig_looking_down_z();
        let change = picker.update_from_pointer(center(&surface), &surface, &rig).unwrap();

        assert_eq!(change.entered, Some(near));
        assert_eq!(change.left, None);
        assert_eq!(picker.hovered(), Some(near));
        assert!(!picker.get(far).unwrap().hovered);
    }

    #[test]
    fn test_single_hover_and_restore() {
        let mut picker = InteractionPicker::new();
        let a = picker.register(&sphere("a", Vec3::new(0.0, 0.0, -100.0), 10.0));
        let b = picker.register(&sphere("b", Vec3::new(0.0, 0.0, -300.0), 10.0));
        let base = picker.get(a).unwrap().visual;

        picker.set_hover(Some(a));
        let hovered = picker.get(a).unwrap().visual;
        assert_eq!(hovered.emissive, HOVER_EMISSIVE);
        assert!((hovered.emissive_intensity - 1.4).abs() < 1e-6);
        assert!((hovered.scale - 1.02).abs() < 1e-6);

        let change = picker.set_hover(Some(b)).unwrap();
        assert_eq!(change, HoverChanged { entered: Some(b), left: Some(a) });
        assert_eq!(picker.get(a).unwrap().visual, base);
        assert_eq!(picker.iter().filter(|r| r.hovered).count(), 1);

        // Same target again is a no-op
        assert_eq!(picker.set_hover(Some(b)), None);
    }

    #[test]
    fn test_original_visual_never_overwritten() {
        let mut picker = InteractionPicker::new();
        let a = picker.register(&sphere("a", Vec3::ZERO, 10.0));
        let base = picker.get(a).unwrap().visual;

        for _ in 0..5 {
            picker.set_hover(Some(a));
            picker.set_hover(None);
        }

        let record = picker.get(a).unwrap();
        assert_eq!(record.original_visual, Some(base));
        assert_eq!(record.visual, base);
    }

    #[test]
    fn test_emphasis_intensity_capped() {
        let bright = VisualState::glowing([1.0, 1.0, 1.0], 2.2);
        assert_eq!(hover_emphasis(bright).emissive_intensity, 2.5);
    }

    #[test]
    fn test_pointer_off_surface_clears_hover() {
        let mut picker = InteractionPicker::new();
        picker.register(&sphere("a", Vec3::new(0.0, 0.0, -100.0), 10.0));
        let surface = SurfaceRect::new(800.0, 600.0);
        let rig = rig_looking_down_z();

        picker.update_from_pointer(center(&surface), &surface, &rig);
        assert!(picker.hovered().is_some());

        picker.update_from_pointer(Vec2::new(900.0, 10.0), &surface, &rig);
        assert_eq!(picker.hovered(), None);
        assert_eq!(picker.pointer(), None);
    }

    #[test]
    fn test_miss_clears_hover() {
        let mut picker = InteractionPicker::new();
        picker.register(&sphere("a", Vec3::new(0.0, 0.0, -100.0), 10.0));
        let surface = SurfaceRect::new(800.0, 600.0);
        let rig = rig_looking_down_z();

        picker.update_from_pointer(center(&surface), &surface, &rig);
        picker.update_from_pointer(Vec2::new(5.0, 5.0), &surface, &rig);
        assert_eq!(picker.hovered(), None);
    }

    #[test]
    fn test_hidden_records_are_skipped() {
        let mut picker = InteractionPicker::new();
        let near = picker.register(&sphere("near", Vec3::new(0.0, 0.0, -100.0), 10.0));
        let far = picker.register(&sphere("far", Vec3::new(0.0, 0.0, -300.0), 30.0));
        let surface = SurfaceRect::new(800.0, 600.0);
        let rig = rig_looking_down_z();

        picker.update_from_pointer(center(&surface), &surface, &rig);
        assert_eq!(picker.hovered(), Some(near));

        let change = picker.set_visible(near, false).unwrap();
        assert_eq!(change.left, Some(near));
        assert_eq!(picker.hovered(), None);

        picker.update_from_pointer(center(&surface), &surface, &rig);
        assert_eq!(picker.hovered(), Some(far));

        picker.remove(far);
        picker.update_from_pointer(center(&surface), &surface, &rig);
        assert_eq!(picker.hovered(), None);
    }

    #[test]
    fn test_part_hit_resolves_to_root() {
        let mut picker = InteractionPicker::new();
        let mut body = sphere("sat", Vec3::new(0.0, 0.0, -100.0), 0.0);
        body.pick_radius = 0.0;
        body.parts.push(PartSpec {
            offset: Vec3::new(20.0, 0.0, 0.0),
            radius: 3.0,
            scale: 1.0,
        });
        let id = picker.register(&body);
        let root = picker.get(id).unwrap().root;
        let nested = picker.add_part(NodeId(root.0 + 1), Vec3::new(0.0, 0.0, 50.0), 4.0).unwrap();
        assert_eq!(picker.owner_of(nested), Some(id));

        // Centre ray misses: the root has no hit sphere
        let straight = ray(Vec3::ZERO, Vec3::NEG_Z);
        assert_eq!(picker.pick(&straight), None);

        // A ray toward the offset part hits it
        let toward_part = ray(Vec3::ZERO, Vec3::new(20.0, 0.0, -100.0));
        assert_eq!(picker.pick(&toward_part), Some(id));

        // The nested part sits at (20, 0, -50)
        let toward_nested = ray(Vec3::ZERO, Vec3::new(20.0, 0.0, -50.0));
        assert_eq!(picker.pick(&toward_nested), Some(id));
    }

    #[test]
    fn test_click_focuses_hovered() {
        let mut picker = InteractionPicker::new();
        let id = picker.register(&sphere("a", Vec3::new(0.0, 0.0, -100.0), 20.0));
        let mut rig = rig_looking_down_z();

        assert_eq!(picker.on_click(&mut rig, 0.0), None);
        assert!(!rig.is_transitioning());

        picker.set_hover(Some(id));
        assert_eq!(picker.on_click(&mut rig, 0.0), Some(id));
        assert!(rig.is_transitioning());
        assert_eq!(rig.focus_distance_target(), 140.0);
        assert_eq!(rig.focus_target(), Vec3::new(0.0, 0.0, -100.0));
    }

    #[test]
    fn test_catalog_registers() {
        let mut picker = InteractionPicker::new();
        for body in default_catalog(5) {
            picker.register(&body);
        }
        assert_eq!(picker.len(), 24);
        assert_eq!(picker.get(InteractableId(0)).unwrap().display_name, "Sun (Photosphere)");
    }
}
