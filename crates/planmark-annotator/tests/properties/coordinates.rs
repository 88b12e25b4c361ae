use std::sync::Arc;

use planmark_annotator::{
    CoordinateConfig, CoordinateSpace, LayoutRect, PageDimensions, StaticSurface,
};
use proptest::prelude::*;

fn page_strategy() -> impl Strategy<Value = PageDimensions> {
    prop_oneof![
        Just(PageDimensions::LETTER),
        Just(PageDimensions::new(792.0, 612.0)),
        (200.0..3000.0f64, 200.0..3000.0f64).prop_map(|(w, h)| PageDimensions::new(w, h)),
    ]
}

/// A surface size and a rectangle that fits inside it.
fn surface_and_rect() -> impl Strategy<Value = ((f64, f64), LayoutRect)> {
    (100.0..2400.0f64, 100.0..2400.0f64).prop_flat_map(|(w, h)| {
        (0.0..0.8f64, 0.0..0.8f64, 0.01..0.2f64, 0.01..0.2f64).prop_map(
            move |(fx, fy, fw, fh)| ((w, h), LayoutRect::new(fx * w, fy * h, fw * w, fh * h)),
        )
    })
}

fn close(a: f64, b: f64, scale: f64) -> bool {
    (a - b).abs() <= 1e-9 * scale.max(1.0)
}

proptest! {
    #[test]
    fn proptest_layout_rect_round_trips(
        page in page_strategy(),
        ((width, height), rect) in surface_and_rect(),
    ) {
        let mut space = CoordinateSpace::new(CoordinateConfig::default());
        space.set_page(Some(page));
        space.attach_surface(Arc::new(StaticSurface::new(width, height)));

        let geometry = space.try_layout_rect_to_doc(rect).unwrap();
        let back = space.try_doc_to_layout(geometry.doc).unwrap();

        prop_assert!(close(back.x, rect.x, width));
        prop_assert!(close(back.y, rect.y, height));
        prop_assert!(close(back.width, rect.width, width));
        prop_assert!(close(back.height, rect.height, height));
    }

    #[test]
    fn proptest_normalized_geometry_is_surface_independent(
        page in page_strategy(),
        ((width, height), rect) in surface_and_rect(),
        scale in 0.5..3.0f64,
    ) {
        let mut small = CoordinateSpace::new(CoordinateConfig::default());
        small.set_page(Some(page));
        small.attach_surface(Arc::new(StaticSurface::new(width, height)));

        let mut large = CoordinateSpace::new(CoordinateConfig::default());
        large.set_page(Some(page));
        large.attach_surface(Arc::new(StaticSurface::new(width * scale, height * scale)));

        let normalized = small.try_layout_rect_to_doc(rect).unwrap().normalized;
        let scaled = large.normalized_to_layout(normalized);

        prop_assert!(close(scaled.x, rect.x * scale, width * scale));
        prop_assert!(close(scaled.width, rect.width * scale, width * scale));
        prop_assert!(close(scaled.height, rect.height * scale, height * scale));
    }
}
