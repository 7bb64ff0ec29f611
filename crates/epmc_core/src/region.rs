//! Nested regions of the sample
//!
//! Regions live in a [`RegionTree`] arena and refer to each other through
//! [`RegionKey`] handles. The root is the chamber; every other region has a
//! parent whose shape fully contains its own. That nesting is the caller's
//! responsibility and is not checked.

use std::fmt;
use std::sync::Arc;

use epmc_geometry::{GeometryError, Shape, Sphere, SMALL_DISP};
use epmc_math::Vec3;
use slotmap::{new_key_type, SlotMap};

use crate::model::{MaterialScatterModel, VacuumModel};

new_key_type! {
    /// Key to a region in a [`RegionTree`]
    ///
    /// Uses generational indexing, so a key from another tree or a stale
    /// key resolves to `None` instead of the wrong region.
    pub struct RegionKey;
}

/// Radius of the default vacuum chamber (metres)
pub const DEFAULT_CHAMBER_RADIUS: f64 = 0.1;

/// One region: a shape filled with one material
#[derive(Clone)]
pub struct Region {
    name: String,
    shape: Arc<dyn Shape>,
    model: Arc<dyn MaterialScatterModel>,
    parent: Option<RegionKey>,
    children: Vec<RegionKey>,
}

impl Region {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &Arc<dyn Shape> {
        &self.shape
    }

    /// The scattering model for the material filling this region
    pub fn model(&self) -> &Arc<dyn MaterialScatterModel> {
        &self.model
    }

    /// Enclosing region, `None` for the chamber
    pub fn parent(&self) -> Option<RegionKey> {
        self.parent
    }

    /// Directly nested regions, in insertion order
    pub fn children(&self) -> &[RegionKey] {
        &self.children
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("name", &self.name)
            .field("model", &self.model.name())
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish()
    }
}

/// Where a candidate step actually ends
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepEnd {
    /// End point, on the boundary when one was crossed
    pub end: Vec3,
    /// Fraction of the candidate step taken (1 when no boundary was crossed)
    pub t: f64,
    /// Whether a boundary was crossed before the candidate end
    pub crossed: bool,
    /// Region containing the point just past `end`; `None` outside the chamber
    pub next: Option<RegionKey>,
}

/// Arena of nested regions rooted at the chamber
#[derive(Clone, Debug)]
pub struct RegionTree {
    regions: SlotMap<RegionKey, Region>,
    chamber: RegionKey,
}

impl RegionTree {
    /// Create a tree whose root region is `chamber_shape` filled with `chamber_model`
    pub fn new(chamber_shape: Arc<dyn Shape>, chamber_model: Arc<dyn MaterialScatterModel>) -> Self {
        let mut regions = SlotMap::with_key();
        let chamber = regions.insert(Region {
            name: "chamber".to_string(),
            shape: chamber_shape,
            model: chamber_model,
            parent: None,
            children: Vec::new(),
        });
        Self { regions, chamber }
    }

    /// Create a tree rooted at a vacuum sphere of the given radius around the origin
    pub fn with_chamber_radius(radius: f64) -> Result<Self, GeometryError> {
        let shape = Sphere::new(Vec3::ZERO, radius)?;
        Ok(Self::new(Arc::new(shape), Arc::new(VacuumModel::new())))
    }

    /// Add a region nested directly inside `parent`
    ///
    /// Overlapping siblings are not detected; the one added first wins
    /// containment queries. Merge overlapping parts with a `Sum` shape
    /// instead.
    pub fn add_region(
        &mut self,
        parent: RegionKey,
        name: impl Into<String>,
        shape: Arc<dyn Shape>,
        model: Arc<dyn MaterialScatterModel>,
    ) -> Result<RegionKey, GeometryError> {
        if !self.regions.contains_key(parent) {
            return Err(GeometryError::UnknownRegion(format!("parent of '{}'", name.into())));
        }
        let key = self.regions.insert(Region {
            name: name.into(),
            shape,
            model,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.regions[parent].children.push(key);
        Ok(key)
    }

    /// The root region
    pub fn chamber(&self) -> RegionKey {
        self.chamber
    }

    pub fn region(&self, key: RegionKey) -> Option<&Region> {
        self.regions.get(key)
    }

    /// Look up a region, turning a bad key into a [`GeometryError`]
    pub fn get(&self, key: RegionKey) -> Result<&Region, GeometryError> {
        self.regions
            .get(key)
            .ok_or_else(|| GeometryError::UnknownRegion(format!("{:?}", key)))
    }

    pub fn parent(&self, key: RegionKey) -> Option<RegionKey> {
        self.regions.get(key).and_then(|r| r.parent)
    }

    pub fn children(&self, key: RegionKey) -> &[RegionKey] {
        self.regions.get(key).map(|r| r.children.as_slice()).unwrap_or(&[])
    }

    pub fn name(&self, key: RegionKey) -> Option<&str> {
        self.regions.get(key).map(|r| r.name.as_str())
    }

    /// First region (in insertion order) with the given name
    pub fn find_by_name(&self, name: &str) -> Option<RegionKey> {
        self.regions.iter().find(|(_, r)| r.name == name).map(|(k, _)| k)
    }

    /// Nesting depth; the chamber is at depth 0
    pub fn depth(&self, key: RegionKey) -> Option<usize> {
        let mut region = self.regions.get(key)?;
        let mut depth = 0;
        while let Some(parent) = region.parent {
            region = &self.regions[parent];
            depth += 1;
        }
        Some(depth)
    }

    /// Number of regions, chamber included
    #[inline]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Always false: a tree has at least its chamber
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionKey, &Region)> {
        self.regions.iter()
    }

    /// Deepest region at or below `from` containing `point`
    ///
    /// Children are searched in insertion order. Returns `None` when `from`
    /// itself does not contain the point.
    pub fn containing_sub_region(&self, from: RegionKey, point: Vec3) -> Option<RegionKey> {
        let region = self.regions.get(from)?;
        if !region.shape.contains(point) {
            return None;
        }
        for &child in &region.children {
            if let Some(found) = self.containing_sub_region(child, point) {
                return Some(found);
            }
        }
        Some(from)
    }

    /// Clip the step from `p0` to `p1`, taken inside `region`, at the first
    /// boundary it crosses
    ///
    /// Both the region's own boundary (leading out to the parent) and every
    /// child boundary (leading in) are considered. When a boundary is hit,
    /// the point just past it is resolved by walking up from the region on
    /// the far side until some ancestor contains it.
    pub fn find_end_of_step(&self, region: RegionKey, p0: Vec3, p1: Vec3) -> Result<StepEnd, GeometryError> {
        let current = self.get(region)?;

        let mut t = current.shape.first_intersection(p0, p1);
        let mut base = if t <= 1.0 { current.parent } else { Some(region) };
        for &child in &current.children {
            let candidate = self.regions[child].shape.first_intersection(p0, p1);
            if candidate <= 1.0 && candidate < t {
                t = candidate;
                base = Some(child);
            }
        }

        if t > 1.0 {
            return Ok(StepEnd {
                end: p1,
                t: 1.0,
                crossed: false,
                next: Some(region),
            });
        }

        let delta = p1 - p0;
        let end = p0 + delta * t;
        let over = end + delta.normalized() * SMALL_DISP;
        while let Some(key) = base {
            if let Some(found) = self.containing_sub_region(key, over) {
                return Ok(StepEnd {
                    end,
                    t,
                    crossed: true,
                    next: Some(found),
                });
            }
            base = self.regions[key].parent;
        }
        Ok(StepEnd {
            end,
            t,
            crossed: true,
            next: None,
        })
    }

    /// Replace the `old` model with `new` throughout the subtree under `from`
    ///
    /// Models are matched by identity, not by value. Returns how many regions
    /// were updated.
    pub fn update_model(
        &mut self,
        from: RegionKey,
        old: &Arc<dyn MaterialScatterModel>,
        new: &Arc<dyn MaterialScatterModel>,
    ) -> usize {
        let mut updated = 0;
        let mut pending = vec![from];
        while let Some(key) = pending.pop() {
            let Some(region) = self.regions.get_mut(key) else {
                continue;
            };
            if Arc::ptr_eq(&region.model, old) {
                region.model = Arc::clone(new);
                updated += 1;
            }
            pending.extend(region.children.iter().copied());
        }
        if updated > 0 {
            log::info!("Swapped model '{}' for '{}' in {} region(s)", old.name(), new.name(), updated);
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConstantLossModel;

    fn sphere(r: f64) -> Arc<dyn Shape> {
        Arc::new(Sphere::new(Vec3::ZERO, r).unwrap())
    }

    fn material(name: &str) -> Arc<dyn MaterialScatterModel> {
        Arc::new(ConstantLossModel::new(name, 1e-7, 1e9).unwrap())
    }

    /// Chamber (r = 0.1) > outer (r = 1e-3) > inner (r = 5e-4)
    fn nested() -> (RegionTree, RegionKey, RegionKey) {
        let mut tree = RegionTree::with_chamber_radius(DEFAULT_CHAMBER_RADIUS).unwrap();
        let outer = tree.add_region(tree.chamber(), "outer", sphere(1e-3), material("a")).unwrap();
        let inner = tree.add_region(outer, "inner", sphere(5e-4), material("b")).unwrap();
        (tree, outer, inner)
    }

    #[test]
    fn test_add_region_links_parent_and_child() {
        let (tree, outer, inner) = nested();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.parent(inner), Some(outer));
        assert_eq!(tree.children(outer), &[inner]);
        assert_eq!(tree.depth(inner), Some(2));
        assert_eq!(tree.find_by_name("inner"), Some(inner));
        assert_eq!(tree.name(tree.chamber()), Some("chamber"));
    }

    #[test]
    fn test_add_region_rejects_unknown_parent() {
        let (mut tree, _, _) = nested();
        let result = tree.add_region(RegionKey::default(), "x", sphere(1e-6), material("c"));
        assert!(matches!(result, Err(GeometryError::UnknownRegion(_))));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_containing_sub_region_nesting() {
        let (tree, outer, inner) = nested();
        let chamber = tree.chamber();
        assert_eq!(tree.containing_sub_region(chamber, Vec3::ZERO), Some(inner));
        // Just inside and just outside the inner boundary
        assert_eq!(tree.containing_sub_region(chamber, Vec3::new(4.999_999e-4, 0.0, 0.0)), Some(inner));
        assert_eq!(tree.containing_sub_region(chamber, Vec3::new(5.000_001e-4, 0.0, 0.0)), Some(outer));
        assert_eq!(tree.containing_sub_region(chamber, Vec3::new(0.05, 0.0, 0.0)), Some(chamber));
        assert_eq!(tree.containing_sub_region(chamber, Vec3::new(0.5, 0.0, 0.0)), None);
        // Starting below the root only searches that subtree
        assert_eq!(tree.containing_sub_region(inner, Vec3::new(0.05, 0.0, 0.0)), None);
    }

    #[test]
    fn test_first_added_sibling_wins() {
        let mut tree = RegionTree::with_chamber_radius(1.0).unwrap();
        let a = tree.add_region(tree.chamber(), "a", sphere(0.5), material("a")).unwrap();
        let _b = tree.add_region(tree.chamber(), "b", sphere(0.5), material("b")).unwrap();
        assert_eq!(tree.containing_sub_region(tree.chamber(), Vec3::ZERO), Some(a));
    }

    #[test]
    fn test_step_inside_region_is_not_clipped() {
        let (tree, outer, _) = nested();
        let p0 = Vec3::new(7e-4, 0.0, 0.0);
        let p1 = Vec3::new(8e-4, 0.0, 0.0);
        let step = tree.find_end_of_step(outer, p0, p1).unwrap();
        assert!(!step.crossed);
        assert_eq!(step.end, p1);
        assert_eq!(step.next, Some(outer));
    }

    #[test]
    fn test_step_into_child() {
        let (tree, outer, inner) = nested();
        let p0 = Vec3::new(-8e-4, 0.0, 0.0);
        let p1 = Vec3::new(0.0, 0.0, 0.0);
        let step = tree.find_end_of_step(outer, p0, p1).unwrap();
        assert!(step.crossed);
        assert_eq!(step.next, Some(inner));
        assert!((step.end.x + 5e-4).abs() < 1e-18);
    }

    #[test]
    fn test_step_out_to_parent() {
        let (tree, outer, inner) = nested();
        let step = tree.find_end_of_step(inner, Vec3::ZERO, Vec3::new(0.0, 0.0, 6e-4)).unwrap();
        assert_eq!(step.next, Some(outer));
        assert!((step.end.z - 5e-4).abs() < 1e-18);
    }

    #[test]
    fn test_step_through_two_shells_resolves_grandparent() {
        // Inner and outer share a boundary: leaving inner lands in the chamber
        let mut tree = RegionTree::with_chamber_radius(1.0).unwrap();
        let outer = tree.add_region(tree.chamber(), "outer", sphere(0.5), material("a")).unwrap();
        let inner = tree.add_region(outer, "inner", sphere(0.5), material("b")).unwrap();
        let step = tree.find_end_of_step(inner, Vec3::ZERO, Vec3::new(0.7, 0.0, 0.0)).unwrap();
        assert_eq!(step.next, Some(tree.chamber()));
    }

    #[test]
    fn test_step_out_of_chamber() {
        let tree = RegionTree::with_chamber_radius(0.1).unwrap();
        let step = tree
            .find_end_of_step(tree.chamber(), Vec3::ZERO, Vec3::new(0.0, 0.0, 0.4))
            .unwrap();
        assert!(step.crossed);
        assert_eq!(step.next, None);
        assert!((step.t - 0.25).abs() < 1e-15);
    }

    #[test]
    fn test_update_model_counts_identity_matches() {
        let mut tree = RegionTree::with_chamber_radius(1.0).unwrap();
        let copper = material("copper");
        let gold = material("gold");
        let a = tree.add_region(tree.chamber(), "a", sphere(0.5), Arc::clone(&copper)).unwrap();
        tree.add_region(a, "b", sphere(0.2), Arc::clone(&copper)).unwrap();
        // Same parameters, different instance: not replaced
        tree.add_region(a, "c", Arc::new(Sphere::new(Vec3::X * 0.3, 0.1).unwrap()), material("copper"))
            .unwrap();

        let chamber = tree.chamber();
        assert_eq!(tree.update_model(chamber, &copper, &gold), 2);
        assert!(Arc::ptr_eq(tree.get(a).unwrap().model(), &gold));
        assert_eq!(tree.update_model(chamber, &copper, &gold), 0);
    }
}
