use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    display::{DisplayFeature, GuideVisibility},
    error::SnapError,
    feature::FeatureId,
    feature_store::FeatureStore,
    geopoint::GeoPoint,
    guide_index::{Guide, GuideAxis, GuideIndex},
    options::SnapOptions,
    pixel::Pixel,
    polygon_draw::{PolygonDraw, StopOutcome},
    rebuild::{RebuildHandle, RebuildSignal},
    rounding::CoordinateRounder,
    snap::{Snap, SnapResolver},
    viewport::Viewport,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DrawState {
    Idle,
    Drawing,
    /// The ring is finished and waits for the host to stop the mode.
    Closed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cursor {
    Default,
    Add,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Escape,
    Enter,
}

/// Mode switch requested from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeChange {
    SimpleSelect { feature_ids: Vec<FeatureId> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Ignored,
    Committed { position: usize, point: GeoPoint },
    Closed(ModeChange),
}

/// What every transition gets to see of the host.
pub struct DrawContext<'a, V: ?Sized, S: ?Sized> {
    pub viewport: &'a V,
    pub store: &'a mut S,
}

impl<'a, V, S> DrawContext<'a, V, S>
where
    V: Viewport + ?Sized,
    S: FeatureStore + ?Sized,
{
    pub fn new(viewport: &'a V, store: &'a mut S) -> Self {
        DrawContext { viewport, store }
    }
}

struct Session {
    polygon: PolygonDraw,
    index: GuideIndex,
    /// Number of committed vertices, and position of the preview slot.
    vertex_position: usize,
    pending: Option<GeoPoint>,
    last_snap: Option<Snap>,
    rebuild: RebuildSignal,
}

impl Session {
    fn rebuild_pool<V, S>(&mut self, ctx: &mut DrawContext<'_, V, S>)
    where
        V: Viewport + ?Sized,
        S: FeatureStore + ?Sized,
    {
        self.index.rebuild(ctx.viewport, &*ctx.store, self.polygon.id());
        self.publish_guides(ctx);
    }

    fn refresh_if_requested<V, S>(&mut self, ctx: &mut DrawContext<'_, V, S>)
    where
        V: Viewport + ?Sized,
        S: FeatureStore + ?Sized,
    {
        if self.rebuild.take() {
            self.rebuild_pool(ctx);
        }
    }

    fn publish_guides<V, S>(&self, ctx: &mut DrawContext<'_, V, S>)
    where
        V: Viewport + ?Sized,
        S: FeatureStore + ?Sized,
    {
        for guide in self.index.guides() {
            ctx.store.upsert(guide.to_feature());
        }
    }

    fn committed(&self) -> &[GeoPoint] {
        &self.polygon.ring()[..self.vertex_position.min(self.polygon.ring().len())]
    }
}

/// Polygon drawing with vertex and alignment-guide snapping.
pub struct SnapMode {
    options: SnapOptions,
    resolver: SnapResolver,
    rounder: CoordinateRounder,
    state: DrawState,
    cursor: Cursor,
    session: Option<Session>,
}

impl SnapMode {
    pub fn new(options: SnapOptions) -> Result<Self, SnapError> {
        let resolver = options.resolver()?;
        let rounder = options.rounder()?;

        Ok(SnapMode {
            options,
            resolver,
            rounder,
            state: DrawState::Idle,
            cursor: Cursor::Default,
            session: None,
        })
    }

    /// Starts a drawing session. The returned handle is meant to be wired to
    /// the host's viewport-change notifications.
    pub fn enter<V, S>(&mut self, ctx: &mut DrawContext<'_, V, S>) -> RebuildHandle
    where
        V: Viewport + ?Sized,
        S: FeatureStore + ?Sized,
    {
        if let Some(session) = &self.session {
            warn!(id = %session.polygon.id(), "Snap mode is already active");
            return session.rebuild.handle();
        }

        let polygon = PolygonDraw::new();
        ctx.store.upsert(polygon.to_feature());

        let mut session = Session {
            polygon,
            index: GuideIndex::new(self.options.visible_vertices_only),
            vertex_position: 0,
            pending: None,
            last_snap: None,
            rebuild: RebuildSignal::default(),
        };
        session.rebuild_pool(ctx);

        info!(
            id = %session.polygon.id(),
            snap_px = self.options.snap_px,
            vertices = session.index.vertex_count(),
            "Entered snap mode"
        );

        let handle = session.rebuild.handle();
        self.session = Some(session);
        self.state = DrawState::Drawing;
        handle
    }

    pub fn on_pointer_move<V, S>(
        &mut self,
        ctx: &mut DrawContext<'_, V, S>,
        pointer: Pixel,
    ) -> Option<Snap>
    where
        V: Viewport + ?Sized,
        S: FeatureStore + ?Sized,
    {
        if self.state != DrawState::Drawing {
            return None;
        }
        let session = self.session.as_mut()?;
        session.refresh_if_requested(ctx);

        let snap = self.resolver.resolve(ctx.viewport, pointer, &session.index);

        session
            .polygon
            .update_coordinate(session.vertex_position, snap.point);
        session.pending = Some(snap.point);
        session.last_snap = Some(snap);
        ctx.store.upsert(session.polygon.to_feature());

        self.cursor = Cursor::Add;
        Some(snap)
    }

    /// Commits the previewed vertex, or closes the ring when it lands on the
    /// previously committed vertex.
    pub fn on_click<V, S>(&mut self, ctx: &mut DrawContext<'_, V, S>) -> ClickOutcome
    where
        V: Viewport + ?Sized,
        S: FeatureStore + ?Sized,
    {
        if self.state != DrawState::Drawing {
            return ClickOutcome::Ignored;
        }
        let Some(session) = self.session.as_mut() else {
            return ClickOutcome::Ignored;
        };
        session.refresh_if_requested(ctx);

        let Some(pending) = session.pending else {
            debug!("Click before any pointer move, nothing to commit");
            return ClickOutcome::Ignored;
        };

        // Rounded on click only, pointer moves stay raw
        let point = self.rounder.round(pending);

        if session.vertex_position > 0
            && session.polygon.ring()[session.vertex_position - 1] == point
        {
            self.state = DrawState::Closed;
            info!(
                id = %session.polygon.id(),
                vertices = session.vertex_position,
                "Ring closed"
            );
            return ClickOutcome::Closed(ModeChange::SimpleSelect {
                feature_ids: vec![session.polygon.id().clone()],
            });
        }

        session.index.extend_guides(ctx.viewport, point);

        let position = session.vertex_position;
        session.polygon.update_coordinate(position, point);
        session.vertex_position += 1;
        session
            .polygon
            .update_coordinate(session.vertex_position, point);

        ctx.store.upsert(session.polygon.to_feature());
        session.publish_guides(ctx);

        debug!(position, lng = point.lng, lat = point.lat, "Committed vertex");
        ClickOutcome::Committed { position, point }
    }

    pub fn on_key_up<V, S>(&mut self, ctx: &mut DrawContext<'_, V, S>, key: Key) -> Option<ModeChange>
    where
        V: Viewport + ?Sized,
        S: FeatureStore + ?Sized,
    {
        if self.state != DrawState::Drawing {
            return None;
        }

        match key {
            Key::Escape => self.on_trash(ctx),
            Key::Enter => {
                let session = self.session.as_ref()?;
                self.state = DrawState::Closed;
                Some(ModeChange::SimpleSelect {
                    feature_ids: vec![session.polygon.id().clone()],
                })
            }
        }
    }

    /// Throws the polygon under construction away.
    pub fn on_trash<V, S>(&mut self, ctx: &mut DrawContext<'_, V, S>) -> Option<ModeChange>
    where
        V: Viewport + ?Sized,
        S: FeatureStore + ?Sized,
    {
        if self.state != DrawState::Drawing {
            return None;
        }
        let session = self.session.as_ref()?;

        session.polygon.discard(&mut *ctx.store);
        self.state = DrawState::Closed;
        info!(id = %session.polygon.id(), "Polygon discarded");

        Some(ModeChange::SimpleSelect {
            feature_ids: Vec::new(),
        })
    }

    /// Rebuilds the snap pool right away. Returns `false` when no session is
    /// active.
    pub fn on_viewport_changed<V, S>(&mut self, ctx: &mut DrawContext<'_, V, S>) -> bool
    where
        V: Viewport + ?Sized,
        S: FeatureStore + ?Sized,
    {
        match self.session.as_mut() {
            Some(session) => {
                session.rebuild.take();
                session.rebuild_pool(ctx);
                true
            }
            None => {
                debug!("Viewport changed outside of a drawing session");
                false
            }
        }
    }

    /// Leaves the mode: removes both guides and finalizes the polygon. Safe
    /// to call at any point of a session.
    pub fn stop<V, S>(&mut self, ctx: &mut DrawContext<'_, V, S>) -> Option<StopOutcome>
    where
        V: Viewport + ?Sized,
        S: FeatureStore + ?Sized,
    {
        let mut session = self.session.take()?;

        ctx.store.remove(&GuideAxis::Horizontal.feature_id());
        ctx.store.remove(&GuideAxis::Vertical.feature_id());

        let outcome = session
            .polygon
            .on_stop(&mut *ctx.store, session.vertex_position);

        self.state = DrawState::Idle;
        self.cursor = Cursor::Default;
        Some(outcome)
    }

    /// Display features owned by the mode. Guides only show up while the
    /// last resolution snapped onto them.
    pub fn to_display_features(&self) -> Vec<DisplayFeature> {
        let Some(session) = &self.session else {
            return Vec::new();
        };

        let visibility = GuideVisibility::from_snap(session.last_snap.as_ref());

        session
            .polygon
            .display_features()
            .into_iter()
            .chain(session.index.guides().into_iter().map(DisplayFeature::guide))
            .filter_map(|feature| visibility.filter(feature))
            .collect()
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn options(&self) -> &SnapOptions {
        &self.options
    }

    pub fn rebuild_handle(&self) -> Option<RebuildHandle> {
        self.session.as_ref().map(|session| session.rebuild.handle())
    }

    pub fn polygon_id(&self) -> Option<&FeatureId> {
        self.session.as_ref().map(|session| session.polygon.id())
    }

    pub fn vertex_count(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |session| session.vertex_position)
    }

    pub fn committed_vertices(&self) -> &[GeoPoint] {
        self.session
            .as_ref()
            .map(|session| session.committed())
            .unwrap_or_default()
    }

    /// Committed vertices followed by the implicit closing point.
    pub fn closed_ring(&self) -> Vec<GeoPoint> {
        let committed = self.committed_vertices();
        let mut ring = committed.to_vec();
        if let Some(first) = committed.first() {
            ring.push(*first);
        }
        ring
    }

    /// The open ring including the live preview vertex.
    pub fn ring(&self) -> &[GeoPoint] {
        self.session
            .as_ref()
            .map(|session| session.polygon.ring())
            .unwrap_or_default()
    }

    pub fn guide(&self, axis: GuideAxis) -> Option<&Guide> {
        self.session
            .as_ref()
            .map(|session| session.index.guide(axis))
    }

    pub fn guide_index(&self) -> Option<&GuideIndex> {
        self.session.as_ref().map(|session| &session.index)
    }

    pub fn last_snap(&self) -> Option<Snap> {
        self.session.as_ref().and_then(|session| session.last_snap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        display::Meta,
        feature_store::MemoryFeatureStore,
        snap::SnapTarget,
        test_utils::{self, PlanarViewport},
    };

    fn enter(
        mode: &mut SnapMode,
        viewport: &PlanarViewport,
        store: &mut MemoryFeatureStore,
    ) -> RebuildHandle {
        mode.enter(&mut DrawContext::new(viewport, store))
    }

    fn move_and_click(
        mode: &mut SnapMode,
        viewport: &PlanarViewport,
        store: &mut MemoryFeatureStore,
        point: GeoPoint,
    ) -> ClickOutcome {
        let mut ctx = DrawContext::new(viewport, store);
        mode.on_pointer_move(&mut ctx, viewport.project(&point));
        mode.on_click(&mut ctx)
    }

    #[test]
    fn test_new_rejects_invalid_options() {
        assert!(SnapMode::new(SnapOptions::default().with_snap_px(-1.0)).is_err());
        assert!(SnapMode::new(SnapOptions::default().with_snap_px(f64::NAN)).is_err());
    }

    #[test]
    fn test_enter_registers_polygon_and_guides() {
        let viewport = PlanarViewport::default();
        let mut store = MemoryFeatureStore::new();
        let mut mode = SnapMode::new(SnapOptions::default()).unwrap();
        assert_eq!(mode.state(), DrawState::Idle);

        enter(&mut mode, &viewport, &mut store);

        assert_eq!(mode.state(), DrawState::Drawing);
        assert_eq!(mode.vertex_count(), 0);
        assert!(store.contains(mode.polygon_id().unwrap()));
        assert!(store.contains(&FeatureId::horizontal_guide()));
        assert!(store.contains(&FeatureId::vertical_guide()));
    }

    #[test]
    fn test_closing_click_does_not_commit_a_third_vertex() {
        let viewport = PlanarViewport::default();
        let mut store = MemoryFeatureStore::new();
        let mut mode = SnapMode::new(SnapOptions::default()).unwrap();
        enter(&mut mode, &viewport, &mut store);

        let first = move_and_click(&mut mode, &viewport, &mut store, GeoPoint::new(0.0, 0.0));
        let second = move_and_click(&mut mode, &viewport, &mut store, GeoPoint::new(1.0, 1.0));
        assert!(matches!(first, ClickOutcome::Committed { position: 0, .. }));
        assert!(matches!(second, ClickOutcome::Committed { position: 1, .. }));
        assert_eq!(mode.state(), DrawState::Drawing);

        let third = move_and_click(&mut mode, &viewport, &mut store, GeoPoint::new(1.0, 1.0));

        let id = mode.polygon_id().unwrap().clone();
        assert_eq!(
            third,
            ClickOutcome::Closed(ModeChange::SimpleSelect {
                feature_ids: vec![id.clone()]
            })
        );
        assert_eq!(mode.state(), DrawState::Closed);

        let rounder = CoordinateRounder::centimeter();
        assert_eq!(
            mode.committed_vertices(),
            &[
                rounder.round(GeoPoint::new(0.0, 0.0)),
                rounder.round(GeoPoint::new(1.0, 1.0))
            ]
        );

        // Further events are ignored until the host stops the mode
        assert_eq!(mode.on_click(&mut DrawContext::new(&viewport, &mut store)), ClickOutcome::Ignored);

        let outcome = mode.stop(&mut DrawContext::new(&viewport, &mut store));
        assert_eq!(outcome, Some(StopOutcome::Discarded { feature_id: id }));
    }

    #[test]
    fn test_click_before_pointer_move_is_ignored() {
        let viewport = PlanarViewport::default();
        let mut store = MemoryFeatureStore::new();
        let mut mode = SnapMode::new(SnapOptions::default()).unwrap();
        enter(&mut mode, &viewport, &mut store);

        let outcome = mode.on_click(&mut DrawContext::new(&viewport, &mut store));

        assert_eq!(outcome, ClickOutcome::Ignored);
        assert_eq!(mode.vertex_count(), 0);
    }

    #[test]
    fn test_commit_opens_a_preview_slot_and_moves_guides() {
        let viewport = PlanarViewport::default();
        let mut store = MemoryFeatureStore::new();
        let mut mode = SnapMode::new(SnapOptions::default()).unwrap();
        enter(&mut mode, &viewport, &mut store);

        move_and_click(&mut mode, &viewport, &mut store, GeoPoint::new(2.0, 3.0));
        let committed = mode.committed_vertices()[0];

        assert_eq!(mode.ring(), &[committed, committed]);
        assert_eq!(
            mode.guide(GuideAxis::Horizontal).unwrap().anchor(),
            Some(committed)
        );

        let stored_guide = store.get(&FeatureId::horizontal_guide()).unwrap();
        assert_eq!(stored_guide.vertices().count(), 2);
        assert!(stored_guide.vertices().all(|point| point.lat == committed.lat));
    }

    #[test]
    fn test_pointer_move_updates_preview_and_cursor() {
        let viewport = PlanarViewport::default();
        let mut store = MemoryFeatureStore::from_features(vec![test_utils::point_feature(
            "a", 4.0, 4.0,
        )]);
        let mut mode = SnapMode::new(SnapOptions::default()).unwrap();
        enter(&mut mode, &viewport, &mut store);
        assert_eq!(mode.cursor(), Cursor::Default);

        let mut ctx = DrawContext::new(&viewport, &mut store);
        let snap = mode.on_pointer_move(&mut ctx, Pixel::new(402.0, 199.0)).unwrap();

        assert_eq!(snap.target, SnapTarget::Vertex);
        assert_eq!(mode.ring(), &[GeoPoint::new(4.0, 4.0)]);
        assert_eq!(mode.cursor(), Cursor::Add);
    }

    #[test]
    fn test_guides_are_only_displayed_while_snapping_onto_them() {
        let viewport = PlanarViewport::default();
        let mut store = MemoryFeatureStore::new();
        let mut mode = SnapMode::new(SnapOptions::default()).unwrap();
        enter(&mut mode, &viewport, &mut store);
        move_and_click(&mut mode, &viewport, &mut store, GeoPoint::new(1.0, 1.0));

        let guides = |mode: &SnapMode| -> Vec<FeatureId> {
            mode.to_display_features()
                .into_iter()
                .filter(|feature| feature.meta == Meta::Guide)
                .map(|feature| feature.id)
                .collect()
        };

        let mut ctx = DrawContext::new(&viewport, &mut store);
        mode.on_pointer_move(&mut ctx, Pixel::new(300.0, 300.0));
        assert!(guides(&mode).is_empty());

        mode.on_pointer_move(&mut ctx, Pixel::new(300.0, 504.0));
        assert_eq!(guides(&mode), vec![FeatureId::horizontal_guide()]);

        mode.on_pointer_move(&mut ctx, Pixel::new(97.0, 250.0));
        assert_eq!(guides(&mode), vec![FeatureId::vertical_guide()]);

        // The filter never touches the stored guide geometry
        assert!(store.contains(&FeatureId::horizontal_guide()));
    }

    #[test]
    fn test_rebuild_request_is_applied_on_next_event() {
        let narrow = PlanarViewport::default();
        let wide = PlanarViewport {
            width: 1200.0,
            ..PlanarViewport::default()
        };
        let mut store = MemoryFeatureStore::from_features(vec![test_utils::point_feature(
            "far", 10.0, 1.0,
        )]);
        let mut mode = SnapMode::new(SnapOptions::default()).unwrap();
        let handle = enter(&mut mode, &narrow, &mut store);

        // (10, 1) is at pixel (1000, 500), outside the narrow viewport
        let pointer = Pixel::new(1003.0, 504.0);
        let before = mode
            .on_pointer_move(&mut DrawContext::new(&narrow, &mut store), pointer)
            .unwrap();
        assert_eq!(before.target, SnapTarget::Pointer);

        assert!(handle.request_rebuild());
        let after = mode
            .on_pointer_move(&mut DrawContext::new(&wide, &mut store), pointer)
            .unwrap();
        assert_eq!(after.target, SnapTarget::Vertex);
        assert_eq!(after.point, GeoPoint::new(10.0, 1.0));
    }

    #[test]
    fn test_stop_removes_guides_and_ends_the_session() {
        let viewport = PlanarViewport::default();
        let mut store = MemoryFeatureStore::new();
        let mut mode = SnapMode::new(SnapOptions::default()).unwrap();
        let handle = enter(&mut mode, &viewport, &mut store);
        move_and_click(&mut mode, &viewport, &mut store, GeoPoint::new(1.0, 1.0));

        let mut ctx = DrawContext::new(&viewport, &mut store);
        let outcome = mode.stop(&mut ctx);

        assert!(matches!(outcome, Some(StopOutcome::Discarded { .. })));
        assert_eq!(mode.state(), DrawState::Idle);
        assert!(!handle.request_rebuild());
        assert!(!mode.on_viewport_changed(&mut ctx));
        assert!(mode.on_pointer_move(&mut ctx, Pixel::new(1.0, 1.0)).is_none());
        assert!(mode.stop(&mut ctx).is_none());

        assert!(!store.contains(&FeatureId::horizontal_guide()));
        assert!(!store.contains(&FeatureId::vertical_guide()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_enter_key_finishes_a_valid_polygon() {
        let viewport = PlanarViewport::default();
        let mut store = MemoryFeatureStore::new();
        let mut mode = SnapMode::new(SnapOptions::default()).unwrap();
        enter(&mut mode, &viewport, &mut store);

        for point in [
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(3.0, 1.5),
            GeoPoint::new(2.0, 4.0),
        ] {
            move_and_click(&mut mode, &viewport, &mut store, point);
        }

        let mut ctx = DrawContext::new(&viewport, &mut store);
        let id = mode.polygon_id().unwrap().clone();
        assert_eq!(
            mode.on_key_up(&mut ctx, Key::Enter),
            Some(ModeChange::SimpleSelect {
                feature_ids: vec![id.clone()]
            })
        );

        let outcome = mode.stop(&mut ctx);
        let Some(StopOutcome::Created(feature)) = outcome else {
            panic!("expected a created polygon, got {outcome:?}");
        };
        assert_eq!(feature.id, id);
        // Three vertices plus the closing coordinate
        assert_eq!(feature.vertices().count(), 4);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_escape_discards_the_polygon() {
        let viewport = PlanarViewport::default();
        let mut store = MemoryFeatureStore::new();
        let mut mode = SnapMode::new(SnapOptions::default()).unwrap();
        enter(&mut mode, &viewport, &mut store);
        for point in [
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(3.0, 1.5),
            GeoPoint::new(2.0, 4.0),
        ] {
            move_and_click(&mut mode, &viewport, &mut store, point);
        }

        let mut ctx = DrawContext::new(&viewport, &mut store);
        assert_eq!(
            mode.on_key_up(&mut ctx, Key::Escape),
            Some(ModeChange::SimpleSelect {
                feature_ids: vec![]
            })
        );
        assert!(matches!(
            mode.stop(&mut ctx),
            Some(StopOutcome::Discarded { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_trash_removes_the_polygon_from_the_store() {
        let viewport = PlanarViewport::default();
        let mut store = MemoryFeatureStore::new();
        let mut mode = SnapMode::new(SnapOptions::default()).unwrap();
        enter(&mut mode, &viewport, &mut store);
        move_and_click(&mut mode, &viewport, &mut store, GeoPoint::new(1.0, 1.0));

        let id = mode.polygon_id().unwrap().clone();
        let mut ctx = DrawContext::new(&viewport, &mut store);
        assert!(mode.on_trash(&mut ctx).is_some());
        assert!(!ctx.store.contains(&id));

        // Only the first request leaves the drawing state
        assert!(mode.on_trash(&mut ctx).is_none());
        assert_eq!(
            mode.stop(&mut ctx),
            Some(StopOutcome::Discarded { feature_id: id })
        );
    }

    #[test]
    fn test_mode_can_be_entered_again_after_stop() {
        let viewport = PlanarViewport::default();
        let mut store = MemoryFeatureStore::new();
        let mut mode = SnapMode::new(SnapOptions::default()).unwrap();

        enter(&mut mode, &viewport, &mut store);
        let first = mode.polygon_id().unwrap().clone();
        mode.stop(&mut DrawContext::new(&viewport, &mut store));

        enter(&mut mode, &viewport, &mut store);
        let second = mode.polygon_id().unwrap().clone();

        assert_ne!(first, second);
        assert_eq!(mode.state(), DrawState::Drawing);
        assert_eq!(mode.vertex_count(), 0);
    }
}
