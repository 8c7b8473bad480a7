use std::collections::HashMap;

use aurora_nwscript::ObjectId;
use indexmap::IndexMap;
use log::warn;

use crate::object::Object;

/// Restartable cursor over a snapshot of object ids.
///
/// Each search owns its cursor, so nested and interleaved searches never
/// disturb one another.
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    candidates: Vec<ObjectId>,
    cursor: usize,
    current: Option<ObjectId>,
}

impl SearchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search over a fixed list of handles, in the given order.
    pub fn over(candidates: Vec<ObjectId>) -> Self {
        Self {
            candidates,
            cursor: 0,
            current: None,
        }
    }

    /// Object the last successful `find_next_object` stopped on.
    pub fn current(&self) -> Option<ObjectId> {
        self.current
    }

    fn reset(&mut self, candidates: Vec<ObjectId>) {
        self.candidates = candidates;
        self.cursor = 0;
        self.current = None;
    }
}

/// Live objects indexed by handle and by tag.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    objects: IndexMap<ObjectId, Object>,
    by_tag: HashMap<String, Vec<ObjectId>>,
    next_id: u32,
}

fn tag_key(tag: &str) -> String {
    tag.to_ascii_lowercase()
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a fresh handle. Handles are never reused within a registry.
    pub fn allocate_id(&mut self) -> ObjectId {
        self.next_id += 1;
        ObjectId(self.next_id)
    }

    pub fn register(&mut self, object: Object) {
        let id = object.id();
        if !id.is_valid() {
            warn!("refusing to register object \"{}\" without a handle", object.tag());
            return;
        }
        if self.objects.contains_key(&id) {
            warn!("object {id} registered twice; replacing");
            self.unregister(id);
        }
        let key = tag_key(object.tag());
        self.by_tag.entry(key).or_default().push(id);
        self.objects.insert(id, object);
    }

    /// Remove an object from every index at once.
    pub fn unregister(&mut self, id: ObjectId) -> Option<Object> {
        let object = self.objects.shift_remove(&id)?;
        let key = tag_key(object.tag());
        if let Some(ids) = self.by_tag.get_mut(&key) {
            ids.retain(|entry| *entry != id);
            if ids.is_empty() {
                self.by_tag.remove(&key);
            }
        }
        Some(object)
    }

    /// Change the tag of a registered object, keeping the tag index current.
    pub fn retag(&mut self, id: ObjectId, tag: &str) -> bool {
        let Some(object) = self.objects.get_mut(&id) else {
            return false;
        };
        let old_key = tag_key(object.tag());
        object.base_mut().set_tag(tag);
        if old_key == tag_key(tag) {
            return true;
        }
        if let Some(ids) = self.by_tag.get_mut(&old_key) {
            ids.retain(|entry| *entry != id);
            if ids.is_empty() {
                self.by_tag.remove(&old_key);
            }
        }
        self.by_tag.entry(tag_key(tag)).or_default().push(id);
        true
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        if !id.is_valid() {
            return None;
        }
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        if !id.is_valid() {
            return None;
        }
        self.objects.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    /// Objects with `tag`, case-insensitively, in registration order.
    pub fn with_tag(&self, tag: &str) -> &[ObjectId] {
        self.by_tag
            .get(&tag_key(tag))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Objects placed in `area`, in registration order.
    pub fn ids_in_area(&self, area: ObjectId) -> Vec<ObjectId> {
        self.objects
            .values()
            .filter(|object| object.base().area() == Some(area))
            .map(Object::id)
            .collect()
    }

    /// Drop every object. Handles stay unique afterwards.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.by_tag.clear();
    }

    /// Start a search over all objects, or over those with `tag`.
    pub fn find_object_init(&self, ctx: &mut SearchContext, tag: Option<&str>) -> bool {
        let candidates = match tag {
            Some(tag) => self.with_tag(tag).to_vec(),
            None => self.ids(),
        };
        ctx.reset(candidates);
        !ctx.candidates.is_empty()
    }

    /// Advance `ctx`. Objects removed since the search began are skipped.
    pub fn find_next_object(&self, ctx: &mut SearchContext) -> bool {
        while let Some(id) = ctx.candidates.get(ctx.cursor).copied() {
            ctx.cursor += 1;
            if self.objects.contains_key(&id) {
                ctx.current = Some(id);
                return true;
            }
        }
        ctx.current = None;
        false
    }
}

#[cfg(test)]
mod tests {
    use aurora_nwscript::ObjectId;

    use super::{ObjectRegistry, SearchContext};
    use crate::object::{Door, Object, Waypoint};

    fn door(registry: &mut ObjectRegistry, tag: &str) -> ObjectId {
        let id = registry.allocate_id();
        let mut door = Door::new(id);
        door.base_mut().set_tag(tag);
        registry.register(Object::Door(door));
        id
    }

    fn collect(registry: &ObjectRegistry, ctx: &mut SearchContext) -> Vec<ObjectId> {
        let mut found = Vec::new();
        while registry.find_next_object(ctx) {
            found.extend(ctx.current());
        }
        found
    }

    #[test]
    fn tag_search_visits_in_insertion_order() {
        let mut registry = ObjectRegistry::new();
        let a = door(&mut registry, "door1");
        door(&mut registry, "door2");
        let b = door(&mut registry, "DOOR1");

        let mut ctx = SearchContext::new();
        assert!(registry.find_object_init(&mut ctx, Some("door1")));
        assert!(registry.find_next_object(&mut ctx));
        assert_eq!(ctx.current(), Some(a));
        assert!(registry.find_next_object(&mut ctx));
        assert_eq!(ctx.current(), Some(b));
        assert!(!registry.find_next_object(&mut ctx));
        assert_eq!(ctx.current(), None);
    }

    #[test]
    fn interleaved_searches_are_independent() {
        let mut registry = ObjectRegistry::new();
        let expected: Vec<_> = (0..4).map(|_| door(&mut registry, "gate")).collect();

        let mut first = SearchContext::new();
        let mut second = SearchContext::new();
        registry.find_object_init(&mut first, Some("gate"));
        registry.find_object_init(&mut second, Some("gate"));

        let mut seen_first = Vec::new();
        let mut seen_second = Vec::new();
        assert!(registry.find_next_object(&mut first));
        seen_first.extend(first.current());
        assert!(registry.find_next_object(&mut second));
        seen_second.extend(second.current());
        assert!(registry.find_next_object(&mut second));
        seen_second.extend(second.current());
        seen_first.extend(collect(&registry, &mut first));
        seen_second.extend(collect(&registry, &mut second));

        assert_eq!(seen_first, expected);
        assert_eq!(seen_second, expected);
    }

    #[test]
    fn unregister_clears_every_index_and_searches_skip_it() {
        let mut registry = ObjectRegistry::new();
        let a = door(&mut registry, "door1");
        let b = door(&mut registry, "door1");

        let mut ctx = SearchContext::new();
        registry.find_object_init(&mut ctx, Some("door1"));
        registry.unregister(a).expect("registered");

        assert!(registry.get(a).is_none());
        assert_eq!(registry.with_tag("door1"), &[b]);
        assert_eq!(collect(&registry, &mut ctx), vec![b]);
    }

    #[test]
    fn retag_moves_the_tag_index() {
        let mut registry = ObjectRegistry::new();
        let id = registry.allocate_id();
        registry.register(Object::Waypoint(Waypoint::new(id)));
        assert!(registry.retag(id, "wp_new"));
        assert_eq!(registry.with_tag("WP_NEW"), &[id]);
        assert!(registry.with_tag("").is_empty());
        assert!(!registry.retag(ObjectId(99), "nope"));
    }

    #[test]
    fn retag_with_the_same_key_keeps_tag_order() {
        let mut registry = ObjectRegistry::new();
        let a = door(&mut registry, "gate");
        let b = door(&mut registry, "gate");
        assert!(registry.retag(a, "GATE"));
        assert_eq!(registry.with_tag("gate"), &[a, b]);
        let object = registry.get(a).unwrap();
        assert_eq!(object.tag(), "GATE");
    }

    #[test]
    fn invalid_handles_never_resolve() {
        let registry = ObjectRegistry::new();
        assert!(registry.get(ObjectId::INVALID).is_none());
        let mut ctx = SearchContext::new();
        assert!(!registry.find_object_init(&mut ctx, None));
        assert!(!registry.find_next_object(&mut ctx));
    }
}
