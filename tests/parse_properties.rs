// Property tests for the entity tree builder.
use fortkit::{
    core::symbols::{Entity, EntityKind},
    parsers::FortranParser,
};
use proptest::prelude::*;

/// One generated source line, from declarations to noise.
fn line_strategy() -> impl Strategy<Value = String> {
    let ident = "[a-z][a-z0-9_]{0,6}";
    prop_oneof![
        ident.prop_map(|n| format!("module {n}")),
        ident.prop_map(|n| format!("program {n}")),
        ident.prop_map(|n| format!("  subroutine {n}(x)")),
        ident.prop_map(|n| format!("  integer function {n}(y)")),
        Just("contains".to_string()),
        Just("end".to_string()),
        Just("  end subroutine".to_string()),
        Just("  end function".to_string()),
        Just("end module".to_string()),
        Just("end program".to_string()),
        Just("  end do".to_string()),
        Just("  end if".to_string()),
        Just("  x = 1 ! subroutine fake".to_string()),
        Just("  print *, 'end module'".to_string()),
        Just(String::new()),
    ]
}

fn source_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(line_strategy(), 0..40).prop_map(|lines| lines.join("\n"))
}

fn assert_contained(parent: &Entity, total: usize) {
    for child in &parent.children {
        let end = child.end_index.expect("every entity is closed");
        assert!(child.start_index <= end, "start after end in {child:?}");
        assert!(end < total.max(1), "end past EOF in {child:?}");
        assert_eq!(child.start_line, child.start_index + 1);
        assert_ne!(child.kind, EntityKind::Root);

        if !parent.is_root() {
            assert!(parent.start_index <= child.start_index);
            assert!(Some(end) <= parent.end_index);
        }
        assert_contained(child, total);
    }
}

proptest! {
    #[test]
    fn parsing_is_deterministic(src in source_strategy()) {
        let first = FortranParser::parse(&src);
        let second = FortranParser::parse(&src);
        prop_assert_eq!(first.root, second.root);
    }

    #[test]
    fn children_nest_inside_parents(src in source_strategy()) {
        let tree = FortranParser::parse(&src);
        assert_contained(&tree.root, tree.lines.len());
    }

    #[test]
    fn siblings_are_in_file_order(src in source_strategy()) {
        fn walk(e: &Entity) {
            for pair in e.children.windows(2) {
                assert!(pair[0].start_index < pair[1].start_index);
            }
            e.children.iter().for_each(walk);
        }
        walk(&FortranParser::parse(&src).root);
    }
}
