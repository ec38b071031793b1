use libreda_dss::prelude::*;

use itertools::Itertools;
use std::rc::Rc;

/// Source layout with one cell "TOP" holding a single 10x10 rectangle on layer (1, 0).
fn source_with_rect() -> (Layout, CellIndex, LayerIndex) {
    let layout = Layout::new();
    let top = layout.create_cell(Some("TOP".into()));
    let layer = layout.find_or_create_layer(1, 0);
    layout
        .cell_by_index(top)
        .unwrap()
        .shapes_get_or_create(layer)
        .insert(Rect::new(Point::new(0, 0), Point::new(10, 10)));
    (layout, top, layer)
}

/// Total doubled area of all polygon-representable shapes below a cell (flattened).
fn flat_area_doubled(layout: &Layout, cell: CellIndex, layer: LayerIndex) -> i64 {
    fn walk(layout: &Layout, cell: CellIndex, layer: LayerIndex) -> i64 {
        let cell_ref = layout.cell_by_index(cell).unwrap();
        let mut area = 0;
        for s in cell_ref.each_shape(layer) {
            if let Some(p) = s.geometry.to_polygon() {
                area += p.area_doubled();
            }
        }
        for inst in cell_ref.each_inst() {
            // Magnification 1 instances preserve the area.
            area += walk(layout, inst.cell(), layer);
        }
        area
    }
    walk(layout, cell, layer)
}

#[test]
fn test_singleton_create_and_release() {
    let (source, top, layer) = source_with_rect();
    let mut store = DeepShapeStore::new();

    let iter = RecursiveShapeIterator::new(&source, top, layer);
    let dl = store
        .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
        .unwrap();

    assert_eq!(store.num_layout_slots(), 1);
    assert_eq!(store.num_live_layouts(), 1);
    assert_eq!(dl.layout_index(), 0);
    assert_eq!(store.layout_ref_count(0).unwrap(), 1);
    assert_eq!(store.sum_layer_ref_counts(0).unwrap(), 1);

    {
        let working = store.layout(0).unwrap();
        assert_eq!(working.num_cells(), 1);
        let working_top = store.initial_cell(0).unwrap();
        let shapes = working
            .cell_by_index(working_top)
            .unwrap()
            .shapes(dl.layer())
            .unwrap();
        assert_eq!(shapes.len(), 1);
    }

    drop(dl);
    assert!(!store.is_valid_layout_index(0));
    // The slot stays, nulled; the index is never reassigned.
    assert_eq!(store.num_layout_slots(), 1);
    assert_eq!(store.num_live_layouts(), 0);
}

#[test]
fn test_shared_layout_across_two_calls() {
    let (source, top, layer) = source_with_rect();
    let mut store = DeepShapeStore::new();

    let iter = RecursiveShapeIterator::new(&source, top, layer);
    let dl1 = store
        .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
        .unwrap();
    let dl2 = store
        .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
        .unwrap();

    assert_eq!(dl1.layout_index(), dl2.layout_index());
    assert_ne!(dl1.layer(), dl2.layer());
    assert_eq!(store.layout_ref_count(dl1.layout_index()).unwrap(), 2);
    assert_eq!(dl1.layer_ref_count().unwrap(), 1);
    assert_eq!(dl2.layer_ref_count().unwrap(), 1);
    assert_eq!(
        store.sum_layer_ref_counts(dl1.layout_index()).unwrap(),
        store.layout_ref_count(dl1.layout_index()).unwrap()
    );

    // Cloning a handle bumps both levels.
    let dl3 = dl1.clone();
    assert_eq!(store.layout_ref_count(dl1.layout_index()).unwrap(), 3);
    assert_eq!(dl1.layer_ref_count().unwrap(), 2);
    assert_eq!(dl1, dl3);
    drop(dl3);
    assert_eq!(dl1.layer_ref_count().unwrap(), 1);

    // Dropping one handle deletes only its layer.
    let layout_index = dl2.layout_index();
    let layer2 = dl2.layer();
    drop(dl2);
    assert!(store.is_valid_layout_index(layout_index));
    assert!(!store.layout(layout_index).unwrap().is_valid_layer(layer2));
    assert!(store.layout(layout_index).unwrap().is_valid_layer(dl1.layer()));
}

#[test]
fn test_reduction_bounds_vertex_count_and_preserves_area() {
    // A comb-shaped polygon with about a thousand vertices.
    let teeth = 250;
    let mut points = Vec::new();
    points.push(Point::new(0, 0));
    points.push(Point::new(4 * teeth, 0));
    for i in (0..teeth).rev() {
        points.push(Point::new(4 * i + 4, 20));
        points.push(Point::new(4 * i + 2, 20));
        points.push(Point::new(4 * i + 2, 4));
        points.push(Point::new(4 * i, 4));
    }
    let comb = Polygon::new(points);
    assert!(comb.vertex_count() > 1000);
    let input_area = comb.area_doubled();

    let layout = Layout::new();
    let top = layout.create_cell(Some("TOP".into()));
    let layer = layout.find_or_create_layer(1, 0);
    layout
        .cell_by_index(top)
        .unwrap()
        .shapes_get_or_create(layer)
        .insert(comb);

    let mut store = DeepShapeStore::new();
    let iter = RecursiveShapeIterator::new(&layout, top, layer);
    let dl = store
        .create_polygon_layer(&iter, 0.0, 16, &CplxTrans::identity())
        .unwrap();

    let working = store.layout(dl.layout_index()).unwrap();
    let working_top = store.initial_cell(dl.layout_index()).unwrap();
    let shapes = working
        .cell_by_index(working_top)
        .unwrap()
        .shapes(dl.layer())
        .unwrap();

    assert!(shapes.len() >= 1);
    let mut total_area = 0;
    shapes.for_each_shape(|s| {
        let p = s.geometry.to_polygon().expect("polygon layer holds polygons");
        assert!(p.vertex_count() <= 16);
        total_area += p.area_doubled();
    });
    assert_eq!(total_area, input_area);
}

#[test]
fn test_text_expansion_with_property() {
    let layout = Layout::new();
    let top = layout.create_cell(Some("TOP".into()));
    let layer = layout.find_or_create_layer(1, 0);
    layout
        .cell_by_index(top)
        .unwrap()
        .shapes_get_or_create(layer)
        .insert(Text::new("N1", Point::new(100, 200)));

    let mut store = DeepShapeStore::new();
    store.set_text_enlargement(2);
    store.set_text_property_name(Some("label".into()));

    let iter = RecursiveShapeIterator::new(&layout, top, layer);
    let dl = store
        .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
        .unwrap();

    let working = store.layout(dl.layout_index()).unwrap();
    let working_top = store.initial_cell(dl.layout_index()).unwrap();
    let shapes = working
        .cell_by_index(working_top)
        .unwrap()
        .shapes(dl.layer())
        .unwrap();
    assert_eq!(shapes.len(), 1);
    shapes.for_each_shape(|s| {
        assert_eq!(
            s.geometry,
            Geometry::Rect(Rect::new(Point::new(98, 198), Point::new(102, 202)))
        );
        let pid = s.properties_id().expect("text box carries the label property");
        let props = working.properties_repository();
        let name_id = props.property_name_id(PropertyName::Text("label".into()));
        let set = props.properties(pid).unwrap();
        assert_eq!(
            set.get(name_id),
            Some(&PropertyValue::String(Rc::new("N1".to_string())))
        );
    });
}

#[test]
fn test_negative_text_enlargement_drops_texts() {
    let layout = Layout::new();
    let top = layout.create_cell(Some("TOP".into()));
    let layer = layout.find_or_create_layer(1, 0);
    layout
        .cell_by_index(top)
        .unwrap()
        .shapes_get_or_create(layer)
        .insert(Text::new("N1", Point::new(100, 200)));

    let mut store = DeepShapeStore::new();
    store.set_text_enlargement(-1);

    let iter = RecursiveShapeIterator::new(&layout, top, layer);
    let dl = store
        .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
        .unwrap();

    let working = store.layout(dl.layout_index()).unwrap();
    let working_top = store.initial_cell(dl.layout_index()).unwrap();
    let shapes = working.cell_by_index(working_top).unwrap().shapes(dl.layer());
    assert!(shapes.map(|s| s.is_empty()).unwrap_or(true));
}

#[test]
fn test_copy_preserves_shape_set() {
    let (source, top, layer) = source_with_rect();
    let mut store = DeepShapeStore::new();
    let iter = RecursiveShapeIterator::new(&source, top, layer);
    let dl = store
        .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
        .unwrap();

    let copy = dl.copy().unwrap();
    assert_eq!(copy.layout_index(), dl.layout_index());
    assert_ne!(copy.layer(), dl.layer());

    let working = store.layout(dl.layout_index()).unwrap();
    let working_top = store.initial_cell(dl.layout_index()).unwrap();
    let cell = working.cell_by_index(working_top).unwrap();
    let original: Vec<_> = cell
        .each_shape(dl.layer())
        .map(|s| format!("{:?}", s.geometry))
        .sorted()
        .collect();
    let copied: Vec<_> = cell
        .each_shape(copy.layer())
        .map(|s| format!("{:?}", s.geometry))
        .sorted()
        .collect();
    assert_eq!(original, copied);
}

#[test]
fn test_derived_and_add_from() {
    let (source, top, layer) = source_with_rect();
    let mut store = DeepShapeStore::new();
    let iter = RecursiveShapeIterator::new(&source, top, layer);
    let dl = store
        .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
        .unwrap();

    let dl2 = dl.derived().unwrap();
    let working = store.layout(dl.layout_index()).unwrap();
    let working_top = store.initial_cell(dl.layout_index()).unwrap();
    let cell = working.cell_by_index(working_top).unwrap();
    assert!(cell.shapes(dl2.layer()).map(|s| s.is_empty()).unwrap_or(true));

    dl2.add_from(&dl).unwrap();
    assert_eq!(
        cell.shapes(dl2.layer()).unwrap().len(),
        cell.shapes(dl.layer()).unwrap().len()
    );
}

#[test]
fn test_back_delivery_into_original() {
    let (source, top, layer) = source_with_rect();
    // Add a subcell with its own shape to exercise hierarchical delivery.
    let sub = source.create_cell(Some("SUB".into()));
    source
        .cell_by_index(sub)
        .unwrap()
        .shapes_get_or_create(layer)
        .insert(Rect::new(Point::new(0, 0), Point::new(4, 4)));
    source.insert_cell_instance(top, sub, CplxTrans::translation(Vector::new(100, 0)));

    let mut store = DeepShapeStore::new();
    let iter = RecursiveShapeIterator::new(&source, top, layer);
    let dl = store
        .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
        .unwrap();

    let target_layer = source.find_or_create_layer(99, 0);
    store.insert(&dl, &source, top, target_layer).unwrap();

    // Shapes land in their original cells, not flattened into the top.
    let top_shapes = source.cell_by_index(top).unwrap().shapes(target_layer).unwrap();
    assert_eq!(top_shapes.len(), 1);
    let sub_shapes = source.cell_by_index(sub).unwrap().shapes(target_layer).unwrap();
    assert_eq!(sub_shapes.len(), 1);

    // The delivered geometry matches the original.
    assert_eq!(
        flat_area_doubled(&source, top, target_layer),
        flat_area_doubled(&source, top, layer)
    );
}

#[test]
fn test_insert_twice_duplicates_only_geometry() {
    let (source, top, layer) = source_with_rect();
    let mut store = DeepShapeStore::new();
    let iter = RecursiveShapeIterator::new(&source, top, layer);
    let dl = store
        .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
        .unwrap();

    let target_layer = source.find_or_create_layer(99, 0);
    store.insert(&dl, &source, top, target_layer).unwrap();
    store.insert(&dl, &source, top, target_layer).unwrap();

    // Merged deposition: the distinct geometry set is unchanged by the second
    // insert (only multiplicities grow).
    let cell = source.cell_by_index(top).unwrap();
    let distinct: Vec<_> = cell
        .each_shape(target_layer)
        .map(|s| format!("{:?}", s.geometry))
        .sorted()
        .dedup()
        .collect();
    assert_eq!(distinct.len(), 1);
}

#[test]
fn test_round_trip_preserves_geometry_modulo_fragmentation() {
    let (source, top, layer) = source_with_rect();
    let mut store = DeepShapeStore::new();
    let iter = RecursiveShapeIterator::new(&source, top, layer);
    let dl = store
        .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
        .unwrap();

    let target_layer = source.find_or_create_layer(99, 0);
    store.insert(&dl, &source, top, target_layer).unwrap();

    let iter2 = RecursiveShapeIterator::new(&source, top, target_layer);
    let dl2 = store
        .create_polygon_layer(&iter2, 0.0, 0, &CplxTrans::identity())
        .unwrap();

    let a: i64 = Region::from(dl.clone())
        .each_polygon()
        .map(|p| p.area_doubled())
        .sum();
    let b: i64 = Region::from(dl2.clone())
        .each_polygon()
        .map(|p| p.area_doubled())
        .sum();
    assert_eq!(a, b);
}

#[test]
fn test_empty_source_behaviors() {
    let source = Layout::new();
    let top = source.create_cell(Some("TOP".into()));
    let layer = source.find_or_create_layer(1, 0);

    let mut store = DeepShapeStore::new();
    let iter = RecursiveShapeIterator::new(&source, top, layer);
    let dl = store
        .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
        .unwrap();

    // Delivery of an empty layer leaves the target empty.
    let target = Layout::new();
    let target_top = target.create_cell(Some("T".into()));
    let target_layer = target.insert_layer();
    store.insert(&dl, &target, target_top, target_layer).unwrap();
    let delivered = target.cell_by_index(target_top).unwrap().shapes(target_layer);
    assert!(delivered.map(|s| s.is_empty()).unwrap_or(true));

    // A never-built working layout has no cells at all and maps to nothing.
    let other_source = Layout::new();
    let other_top = other_source.create_cell(Some("O".into()));
    let other_layer = other_source.find_or_create_layer(2, 0);
    let other_iter = RecursiveShapeIterator::new(&other_source, other_top, other_layer);
    let n = store.layout_for_iter(&other_iter, &CplxTrans::identity());
    let cm = store
        .cell_mapping_to_original(n, &target, target_top, None)
        .unwrap();
    assert!(cm.is_empty());
}

#[test]
fn test_single_cell_target_clones_subcells() {
    let (source, top, layer) = source_with_rect();
    let sub = source.create_cell(Some("SUB".into()));
    source
        .cell_by_index(sub)
        .unwrap()
        .shapes_get_or_create(layer)
        .insert(Rect::new(Point::new(0, 0), Point::new(4, 4)));
    source.insert_cell_instance(top, sub, CplxTrans::translation(Vector::new(100, 0)));

    let mut store = DeepShapeStore::new();
    let iter = RecursiveShapeIterator::new(&source, top, layer);
    let dl = store
        .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
        .unwrap();

    let target = Layout::new();
    let target_top = target.create_cell(Some("SINGLE".into()));
    let target_layer = target.insert_layer();
    store.insert(&dl, &target, target_top, target_layer).unwrap();

    // The subcell was cloned into the target and instantiated.
    assert_eq!(target.num_cells(), 2);
    assert_eq!(
        target.cell_by_index(target_top).unwrap().num_instances(),
        1
    );
    assert_eq!(
        flat_area_doubled(&target, target_top, target_layer),
        flat_area_doubled(&source, top, layer)
    );
}

#[test]
fn test_variants_force_cloned_subtree_on_back_delivery() {
    let (source, top, layer) = source_with_rect();
    let sub = source.create_cell(Some("SUB".into()));
    source
        .cell_by_index(sub)
        .unwrap()
        .shapes_get_or_create(layer)
        .insert(Rect::new(Point::new(0, 0), Point::new(4, 4)));
    source.insert_cell_instance(top, sub, CplxTrans::translation(Vector::new(100, 0)));

    let mut store = DeepShapeStore::new();
    let iter = RecursiveShapeIterator::new(&source, top, layer);
    let dl = store
        .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
        .unwrap();

    // Emulate an operator that specializes SUB per context: create a variant
    // cell in the working layout, instantiate it and register it.
    let working = store.layout(dl.layout_index()).unwrap();
    let working_top = store.initial_cell(dl.layout_index()).unwrap();
    let variant = working.create_cell(Some("SUB$VAR".into()));
    working
        .cell_by_index(variant)
        .unwrap()
        .shapes_get_or_create(dl.layer())
        .insert(Rect::new(Point::new(0, 0), Point::new(4, 4)));
    working.insert_cell_instance(
        working_top,
        variant,
        CplxTrans::translation(Vector::new(200, 0)),
    );

    let mut var_map = std::collections::BTreeMap::new();
    let mut by_trans = std::collections::BTreeMap::new();
    by_trans.insert(CplxTrans::translation(Vector::new(200, 0)), variant);
    var_map.insert(sub, by_trans);
    store.issue_variants(dl.layout_index(), &var_map).unwrap();

    let cells_before = source.num_cells();
    let target_layer = source.find_or_create_layer(99, 0);
    store.insert(&dl, &source, top, target_layer).unwrap();

    // SUB cannot be back-mapped any more (it has two images, one a variant):
    // the delivery synthesizes fresh cells instead of writing into SUB.
    assert!(source.num_cells() > cells_before);
    let sub_shapes = source.cell_by_index(sub).unwrap().shapes(target_layer);
    assert!(sub_shapes.map(|s| s.is_empty()).unwrap_or(true));
}

#[test]
fn test_require_singular() {
    let (source_a, top_a, layer_a) = source_with_rect();
    let source_b = Layout::new();
    let top_b = source_b.create_cell(Some("B".into()));
    let layer_b = source_b.find_or_create_layer(1, 0);
    source_b
        .cell_by_index(top_b)
        .unwrap()
        .shapes_get_or_create(layer_b)
        .insert(Rect::new(Point::new(0, 0), Point::new(5, 5)));

    let mut store = DeepShapeStore::new();
    let iter_a = RecursiveShapeIterator::new(&source_a, top_a, layer_a);
    let _dl_a = store
        .create_polygon_layer(&iter_a, 0.0, 0, &CplxTrans::identity())
        .unwrap();
    assert!(store.require_singular().is_ok());

    let iter_b = RecursiveShapeIterator::new(&source_b, top_b, layer_b);
    let _dl_b = store
        .create_polygon_layer(&iter_b, 0.0, 0, &CplxTrans::identity())
        .unwrap();
    assert_eq!(store.require_singular(), Err(DeepStoreError::NotSingular));
}

#[test]
fn test_store_lost() {
    let (source, top, layer) = source_with_rect();
    let dl = {
        let mut store = DeepShapeStore::new();
        let iter = RecursiveShapeIterator::new(&source, top, layer);
        store
            .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
            .unwrap()
    };
    assert_eq!(dl.initial_cell(), Err(DeepStoreError::StoreLost));
    assert!(dl.layout().is_err());
    assert_eq!(dl.derived().unwrap_err(), DeepStoreError::StoreLost);
}

#[test]
fn test_region_not_deep() {
    let mut region = Region::new();
    region.insert(Polygon::from_rect(&Rect::new(
        Point::new(0, 0),
        Point::new(10, 10),
    )));
    assert_eq!(
        DeepLayer::try_from(&region).unwrap_err(),
        DeepStoreError::NotDeep
    );
}

#[test]
fn test_dbu_scaling_with_magnification() {
    let (source, top, layer) = source_with_rect();
    let mut store = DeepShapeStore::new();
    let iter = RecursiveShapeIterator::new(&source, top, layer);
    let trans = CplxTrans::magnifying(2.0);
    let dl = store.create_polygon_layer(&iter, 0.0, 0, &trans).unwrap();

    let working = store.layout(dl.layout_index()).unwrap();
    assert!((working.dbu() - source.dbu() / 2.0).abs() < 1e-12);

    // Coordinates are scaled by the magnification, so the physical size is kept.
    let working_top = store.initial_cell(dl.layout_index()).unwrap();
    let bbox = working
        .cell_by_index(working_top)
        .unwrap()
        .shapes(dl.layer())
        .unwrap()
        .try_bounding_box()
        .unwrap();
    assert_eq!(bbox, Rect::new(Point::new(0, 0), Point::new(20, 20)));
}

#[test]
fn test_clip_region_creates_variants_and_clips_shapes() {
    let source = Layout::new();
    let top = source.create_cell(Some("TOP".into()));
    let sub = source.create_cell(Some("SUB".into()));
    let layer = source.find_or_create_layer(1, 0);
    source
        .cell_by_index(sub)
        .unwrap()
        .shapes_get_or_create(layer)
        .insert(Rect::new(Point::new(0, 0), Point::new(10, 10)));
    // One instance fully inside the clip, one partially covered, one outside.
    source.insert_cell_instance(top, sub, CplxTrans::translation(Vector::new(0, 0)));
    source.insert_cell_instance(top, sub, CplxTrans::translation(Vector::new(95, 0)));
    source.insert_cell_instance(top, sub, CplxTrans::translation(Vector::new(500, 0)));

    let mut store = DeepShapeStore::new();
    let iter = RecursiveShapeIterator::new(&source, top, layer)
        .with_region(Rect::new(Point::new(-5, -5), Point::new(100, 100)));
    let dl = store
        .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
        .unwrap();

    // Plain image of SUB plus one clip variant; the outside instance is dropped.
    let working = store.layout(dl.layout_index()).unwrap();
    assert_eq!(working.num_cells(), 3);
    let working_top = store.initial_cell(dl.layout_index()).unwrap();
    assert_eq!(
        working.cell_by_index(working_top).unwrap().num_instances(),
        2
    );

    // Clipped flat area: full 10x10 plus the 5x10 remnant of the partial instance.
    let flat: i64 = Region::from(dl.clone())
        .each_polygon()
        .map(|p| p.area_doubled())
        .sum();
    assert_eq!(flat, 2 * (100 + 50));
}

#[test]
fn test_edge_layer_from_polygon_outlines() {
    let (source, top, layer) = source_with_rect();
    let mut store = DeepShapeStore::new();
    let iter = RecursiveShapeIterator::new(&source, top, layer);
    let dl = store
        .create_edge_layer(&iter, false, &CplxTrans::identity())
        .unwrap();

    let working = store.layout(dl.layout_index()).unwrap();
    let working_top = store.initial_cell(dl.layout_index()).unwrap();
    let shapes = working
        .cell_by_index(working_top)
        .unwrap()
        .shapes(dl.layer())
        .unwrap();
    // Four boundary edges of the rectangle.
    assert_eq!(shapes.len(), 4);
    shapes.for_each_shape(|s| {
        assert!(matches!(s.geometry, Geometry::Edge(_)));
    });
}

#[test]
fn test_edge_pair_layer_and_insert_as_polygons() {
    let source = Layout::new();
    let top = source.create_cell(Some("TOP".into()));
    let layer = source.find_or_create_layer(1, 0);
    source
        .cell_by_index(top)
        .unwrap()
        .shapes_get_or_create(layer)
        .insert(EdgePair::new(
            Edge::new(Point::new(0, 0), Point::new(10, 0)),
            Edge::new(Point::new(10, 5), Point::new(0, 5)),
        ));

    let mut store = DeepShapeStore::new();
    let iter = RecursiveShapeIterator::new(&source, top, layer);
    let dl = store
        .create_edge_pair_layer(&iter, &CplxTrans::identity())
        .unwrap();

    let working = store.layout(dl.layout_index()).unwrap();
    let working_top = store.initial_cell(dl.layout_index()).unwrap();
    assert_eq!(
        working
            .cell_by_index(working_top)
            .unwrap()
            .shapes(dl.layer())
            .unwrap()
            .len(),
        1
    );

    // Delivery as polygons converts the pair into a marker polygon.
    let target_layer = source.find_or_create_layer(99, 0);
    store
        .insert_as_polygons(&dl, &source, top, target_layer, 0)
        .unwrap();
    let delivered = source.cell_by_index(top).unwrap().shapes(target_layer).unwrap();
    assert_eq!(delivered.len(), 1);
    delivered.for_each_shape(|s| {
        let p = s.geometry.to_polygon().unwrap();
        assert_eq!(p.area_doubled(), 100);
    });
}

#[test]
fn test_deep_layer_ordering() {
    let (source, top, layer) = source_with_rect();
    let mut store = DeepShapeStore::new();
    let iter = RecursiveShapeIterator::new(&source, top, layer);
    let dl1 = store
        .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
        .unwrap();
    let dl2 = store
        .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
        .unwrap();

    assert!(dl1 < dl2 || dl2 < dl1);
    assert_eq!(dl1.clone(), dl1);
    let mut v = vec![dl2.clone(), dl1.clone()];
    v.sort();
    assert_eq!(v[0], dl1);
}
