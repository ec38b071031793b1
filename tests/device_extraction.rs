use libreda_dss::prelude::*;

use itertools::Itertools;

/// Recognizes every polygon of the first input layer as one device of class "X"
/// with a single terminal covering the polygon.
struct RectDeviceExtractor;

impl DeviceExtractorDelegate for RectDeviceExtractor {
    fn create_device_classes(&mut self, core: &mut ExtractorCore) {
        core.register_device_class(DeviceClass::new("X", vec!["T".into()]));
    }

    fn get_connectivity(&self, _layout: &Layout, layers: &[LayerIndex]) -> Connectivity {
        let mut conn = Connectivity::new();
        conn.connect(layers[0]);
        conn
    }

    fn extract_devices(
        &mut self,
        core: &mut ExtractorCore,
        layout: &Layout,
        layer_geometry: &[Region],
    ) {
        for polygon in layer_geometry[0].each_polygon() {
            let device = core.create_device(0);
            core.define_terminal(layout, device, 0, 0, polygon.as_ref().clone());
        }
    }
}

fn build_deep_layer(
    store: &mut DeepShapeStore,
    source: &Layout,
    top: CellIndex,
    layer: LayerIndex,
) -> DeepLayer {
    let iter = RecursiveShapeIterator::new(source, top, layer);
    store
        .create_polygon_layer(&iter, 0.0, 0, &CplxTrans::identity())
        .unwrap()
}

#[test]
fn test_extraction_happy_path() {
    let source = Layout::new();
    let top = source.create_cell(Some("TOP".into()));
    let layer = source.find_or_create_layer(1, 0);
    let shapes = source.cell_by_index(top).unwrap().shapes_get_or_create(layer);
    shapes.insert(Rect::new(Point::new(0, 0), Point::new(10, 10)));
    shapes.insert(Rect::new(Point::new(100, 100), Point::new(120, 130)));

    let mut store = DeepShapeStore::new();
    let dl = build_deep_layer(&mut store, &source, top, layer);
    let region = Region::from(dl.clone());

    let mut extractor = NetlistDeviceExtractor::new(RectDeviceExtractor);
    extractor.initialize(Netlist::new());
    extractor.extract(&[region]).unwrap();

    let netlist = extractor.netlist();
    assert_eq!(netlist.num_circuits(), 1);
    let circuit = netlist.circuit_by_name("TOP").expect("circuit named after the cell");
    assert_eq!(circuit.num_devices(), 2);
    assert_eq!(
        circuit.each_device().map(|d| d.name().to_string()).sorted().collect_vec(),
        vec!["1".to_string(), "2".to_string()]
    );

    // The terminal shapes were annotated into the working layout: one polygon
    // reference per device carrying the (device id, terminal id) property under
    // the reserved numeric property name 0.
    let working = store.layout(dl.layout_index()).unwrap();
    let working_top = store.initial_cell(dl.layout_index()).unwrap();
    let cell = working.cell_by_index(working_top).unwrap();
    let props = working.properties_repository();
    let terminal_key = props.property_name_id(PropertyName::Number(0));

    let mut annotations = Vec::new();
    cell.shapes(dl.layer()).unwrap().for_each_shape(|s| {
        if let Some(pid) = s.properties_id() {
            let set = props.properties(pid).unwrap();
            let value: (u64, u64) = set
                .get(terminal_key)
                .expect("terminal property present")
                .try_into()
                .expect("terminal property is an id pair");
            let bbox = s.try_bounding_box().unwrap();
            annotations.push((value, bbox));
        }
    });
    annotations.sort_by_key(|(v, _)| *v);

    let device_ids: Vec<u64> = circuit.each_device().map(|d| d.id().value()).sorted().collect();
    assert_eq!(
        annotations.iter().map(|(v, _)| v.0).collect_vec(),
        device_ids
    );
    assert!(annotations.iter().all(|(v, _)| v.1 == 0));

    // Each terminal polygon matches its rectangle.
    let boxes = annotations.iter().map(|(_, b)| *b).collect_vec();
    assert!(boxes.contains(&Rect::new(Point::new(0, 0), Point::new(10, 10))));
    assert!(boxes.contains(&Rect::new(Point::new(100, 100), Point::new(120, 130))));
}

#[test]
fn test_extraction_touching_shapes_form_one_device_cluster() {
    let source = Layout::new();
    let top = source.create_cell(Some("TOP".into()));
    let layer = source.find_or_create_layer(1, 0);
    let shapes = source.cell_by_index(top).unwrap().shapes_get_or_create(layer);
    // Two touching rectangles: one cluster, so extract_devices sees both at once.
    shapes.insert(Rect::new(Point::new(0, 0), Point::new(10, 10)));
    shapes.insert(Rect::new(Point::new(10, 0), Point::new(20, 10)));

    let mut store = DeepShapeStore::new();
    let dl = build_deep_layer(&mut store, &source, top, layer);
    let region = Region::from(dl);

    // Count cluster invocations through a counting delegate.
    struct CountingExtractor {
        invocations: usize,
        polygons_seen: usize,
    }
    impl DeviceExtractorDelegate for CountingExtractor {
        fn get_connectivity(&self, _layout: &Layout, layers: &[LayerIndex]) -> Connectivity {
            let mut conn = Connectivity::new();
            conn.connect(layers[0]);
            conn
        }
        fn extract_devices(
            &mut self,
            _core: &mut ExtractorCore,
            _layout: &Layout,
            layer_geometry: &[Region],
        ) {
            self.invocations += 1;
            self.polygons_seen += layer_geometry[0].len();
        }
    }

    let mut extractor = NetlistDeviceExtractor::new(CountingExtractor {
        invocations: 0,
        polygons_seen: 0,
    });
    extractor.initialize(Netlist::new());
    extractor.extract(&[region]).unwrap();

    assert_eq!(extractor.delegate().invocations, 1);
    assert_eq!(extractor.delegate().polygons_seen, 2);
}

#[test]
fn test_extraction_over_hierarchy_uses_root_clusters() {
    let source = Layout::new();
    let top = source.create_cell(Some("TOP".into()));
    let sub = source.create_cell(Some("SUB".into()));
    let layer = source.find_or_create_layer(1, 0);
    source
        .cell_by_index(sub)
        .unwrap()
        .shapes_get_or_create(layer)
        .insert(Rect::new(Point::new(0, 0), Point::new(10, 10)));
    // The child shape lands at (50, 0) and touches the parent shape.
    source
        .cell_by_index(top)
        .unwrap()
        .shapes_get_or_create(layer)
        .insert(Rect::new(Point::new(30, 0), Point::new(50, 10)));
    source.insert_cell_instance(top, sub, CplxTrans::translation(Vector::new(50, 0)));

    let mut store = DeepShapeStore::new();
    let dl = build_deep_layer(&mut store, &source, top, layer);
    let region = Region::from(dl);

    // One device per cluster, regardless of how many polygons it folds in.
    struct ClusterDeviceExtractor;
    impl DeviceExtractorDelegate for ClusterDeviceExtractor {
        fn create_device_classes(&mut self, core: &mut ExtractorCore) {
            core.register_device_class(DeviceClass::new("X", vec!["T".into()]));
        }
        fn get_connectivity(&self, _layout: &Layout, layers: &[LayerIndex]) -> Connectivity {
            let mut conn = Connectivity::new();
            conn.connect(layers[0]);
            conn
        }
        fn extract_devices(
            &mut self,
            core: &mut ExtractorCore,
            layout: &Layout,
            layer_geometry: &[Region],
        ) {
            let device = core.create_device(0);
            if let Some(polygon) = layer_geometry[0].each_polygon().next() {
                core.define_terminal(layout, device, 0, 0, polygon.as_ref().clone());
            }
        }
    }

    let mut extractor = NetlistDeviceExtractor::new(ClusterDeviceExtractor);
    extractor.initialize(Netlist::new());
    extractor.extract(&[region]).unwrap();

    let netlist = extractor.netlist();
    // Both cells get a circuit; the connected geometry is extracted once, as a
    // root cluster of the top cell with the child shapes folded in.
    assert_eq!(netlist.num_circuits(), 2);
    let top_circuit = netlist.circuit_by_name("TOP").unwrap();
    assert_eq!(top_circuit.num_devices(), 1);
    let sub_circuit = netlist.circuit_by_name("SUB").unwrap();
    assert_eq!(sub_circuit.num_devices(), 0);
}
