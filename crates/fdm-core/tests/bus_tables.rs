use fdm_core::{DataBus, FdmError, NodeKind, Table1D, Table2D};

#[test]
fn refs_resolved_once_see_later_writes() {
    let mut bus = DataBus::new();
    let writer = bus.add_value("controls/elevator").unwrap();
    let reader = bus.get_ref("controls/elevator").unwrap();
    assert_eq!(writer, reader);

    for k in 0..10 {
        bus.set(writer, k as f64 * 0.1);
        assert_eq!(bus.get(reader), k as f64 * 0.1);
    }
    assert_eq!(bus.get_value("controls/elevator").unwrap(), 0.9);
}

#[test]
fn groups_are_not_values() {
    let mut bus = DataBus::new();
    bus.add_value("input/engine_1/throttle").unwrap();
    let err = bus.get_ref("input/engine_1").unwrap_err();
    assert!(matches!(err, FdmError::NullPointer { .. }));
    assert!(bus.add_node("input/engine_1/throttle/x", NodeKind::Value).is_err());
}

#[test]
fn value_paths_list_the_whole_tree() {
    let mut bus = DataBus::new();
    for path in ["output/flight/ias", "input/controls/roll", "controls/aileron"] {
        bus.add_value(path).unwrap();
    }
    assert_eq!(
        bus.value_paths(),
        vec!["controls/aileron", "input/controls/roll", "output/flight/ias"]
    );
}

#[test]
fn shaping_table_drives_bus_value() {
    // stick-to-surface gearing: steeper near full deflection
    let gearing = Table1D::from_pairs(&[(-1.0, -0.4), (-0.5, -0.12), (0.5, 0.12), (1.0, 0.4)]).unwrap();
    let mut bus = DataBus::new();
    let input = bus.add_value("input/controls/pitch").unwrap();
    let output = bus.add_value("controls/elevator").unwrap();

    for (stick, expected) in [(0.0, 0.0), (0.75, 0.26), (-2.0, -0.4)] {
        bus.set(input, stick);
        bus.set(output, gearing.value(bus.get(input)));
        assert!((bus.get(output) - expected).abs() < 1e-12);
    }
}

#[test]
fn table2d_rows_reduce_to_1d() {
    let t = Table2D::from_rows(
        vec![0.0, 10.0],
        vec![0.0, 1.0, 2.0],
        &[vec![0.0, 1.0, 4.0], vec![10.0, 11.0, 14.0]],
    )
    .unwrap();
    let mid = t.row_table(5.0);
    assert_eq!(mid.keys(), &[0.0, 1.0, 2.0]);
    assert_eq!(mid.values(), &[5.0, 6.0, 9.0]);
    assert_eq!(t.value(5.0, 1.5), mid.value(1.5));
}
