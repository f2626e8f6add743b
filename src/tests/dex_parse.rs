use crate::dex::{AccessFlags, DexFile, DexOptions, ErrorKind, StructuralWarning, NO_INDEX};
use crate::tests::fixture::{ClassSpec, DexBuilder};

fn two_classes() -> DexBuilder {
    let mut b = DexBuilder::new();
    let object = b.type_id("Ljava/lang/Object;");
    let runnable = b.type_id("Ljava/lang/Runnable;");
    let cloneable = b.type_id("Ljava/lang/Cloneable;");
    let base = b.type_id("Lcom/example/Base;");
    let child = b.type_id("Lcom/example/Child;");

    let mut spec = ClassSpec::new(base);
    spec.superclass = object;
    b.class(spec);

    let mut spec = ClassSpec::new(child);
    spec.access = 0x11;
    spec.superclass = base;
    spec.interfaces = vec![runnable as u16, cloneable as u16];
    b.class(spec);
    b
}

#[test]
fn strings_resolve_deterministically() {
    let mut b = DexBuilder::new();
    let plain = b.string("plain");
    let nul = b.string("a\0b");
    let dex = DexFile::from_vec(b.build()).unwrap();

    assert_eq!(dex.string(plain).unwrap(), b"plain");
    assert_eq!(dex.string(plain).unwrap(), dex.string(plain).unwrap());
    // The embedded NUL is stored in its two-byte form
    assert_eq!(dex.string(nul).unwrap(), &[0x61, 0xC0, 0x80, 0x62]);
    assert_eq!(dex.string_text(nul).unwrap(), "a\0b");

    let e = dex.string(2).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::IndexOutOfRange);
}

#[test]
fn types_normalize_to_class_names() {
    let mut b = DexBuilder::new();
    let string = b.type_id("Ljava/lang/String;");
    let ints = b.type_id("[I");
    let objects = b.type_id("[Ljava/lang/Object;");
    let int = b.type_id("I");
    let dex = DexFile::from_vec(b.build()).unwrap();

    assert_eq!(dex.type_desc(string).unwrap(), "Ljava/lang/String;");
    assert_eq!(dex.cls_type(string).unwrap(), "java/lang/String");
    assert_eq!(dex.cls_type(ints).unwrap(), "[I");
    assert_eq!(dex.cls_type(objects).unwrap(), "[Ljava/lang/Object;");
    assert_eq!(dex.type_desc(int).unwrap(), "I");
    assert_eq!(dex.cls_type(int).unwrap_err().kind(), ErrorKind::Format);
    assert_eq!(dex.type_desc(4).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
}

#[test]
fn class_definitions_are_read_eagerly() {
    let dex = DexFile::from_vec(two_classes().build()).unwrap();
    assert!(dex.warnings().is_empty());
    assert_eq!(dex.classes().len(), 2);

    let base = &dex.classes()[0];
    assert_eq!(base.name, "com/example/Base");
    assert_eq!(base.superclass.as_deref(), Some("java/lang/Object"));
    assert!(base.interfaces.is_empty());
    assert!(!base.is_parsed());

    let child = dex.class_by_name("com/example/Child").unwrap();
    assert_eq!(child.access, AccessFlags::PUBLIC | AccessFlags::FINAL);
    assert_eq!(child.superclass.as_deref(), Some("com/example/Base"));
    assert_eq!(child.interfaces, vec!["java/lang/Runnable", "java/lang/Cloneable"]);
    assert!(dex.class_by_name("com/example/Missing").is_none());
}

#[test]
fn missing_superclass_is_none() {
    let mut b = DexBuilder::new();
    let object = b.type_id("Ljava/lang/Object;");
    b.class(ClassSpec::new(object));
    let dex = DexFile::from_vec(b.build()).unwrap();
    assert_eq!(dex.classes()[0].superclass, None);
    assert_eq!(NO_INDEX, u32::MAX);
}

#[test]
fn primitive_class_type_fails_construction() {
    let mut b = DexBuilder::new();
    let int = b.type_id("I");
    b.class(ClassSpec::new(int));
    let e = DexFile::from_vec(b.build()).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Format);
    assert!(e.to_string().contains("class_def #0"), "{}", e);
}

#[test]
fn file_size_mismatch_is_only_a_warning() {
    let mut b = two_classes();
    b.file_size = Some(0x10);
    let dex = DexFile::from_vec(b.build()).unwrap();
    assert_eq!(dex.warnings().len(), 1);
    assert!(matches!(dex.warnings()[0], StructuralWarning::FileSize { declared: 0x10, .. }));
    assert_eq!(dex.classes().len(), 2);
}

#[test]
fn bad_magic_is_only_a_warning() {
    let mut bytes = two_classes().build();
    bytes[4..8].copy_from_slice(b"abc\0");
    let dex = DexFile::from_bytes(&bytes).unwrap();
    assert!(matches!(dex.warnings()[0], StructuralWarning::Magic { .. }));
    assert_eq!(dex.header().version(), None);
    assert_eq!(dex.classes().len(), 2);
}

#[test]
fn classes_can_be_skipped() {
    let options = DexOptions::new().parse_classes(false);
    let dex = DexFile::with_options(two_classes().build(), options).unwrap();
    assert!(dex.classes().is_empty());
    assert_eq!(dex.header().class_defs.size, 2);
    assert_eq!(dex.cls_type(0).unwrap(), "java/lang/Object");
}

#[test]
fn truncated_image_is_out_of_bounds() {
    let bytes = two_classes().build();
    let e = DexFile::from_bytes(&bytes[..0x50]).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::OutOfBounds);
}

#[test]
fn member_ids_resolve_from_the_image() {
    let mut b = DexBuilder::new();
    let f = b.field("Lcom/example/Point;", "x", "I");
    let m = b.method("Lcom/example/Point;", "scale", "V", &["J", "[Ljava/lang/String;", "F"]);
    let dex = DexFile::from_vec(b.build()).unwrap();

    let field = dex.field_id(f).unwrap();
    assert_eq!(field.triple(), ("com/example/Point", "x", "I"));
    assert_eq!(field.member.to_string(), "com/example/Point->x:I");

    let method = dex.method_id(m).unwrap();
    assert_eq!(method.triple(), ("com/example/Point", "scale", "(J[Ljava/lang/String;F)V"));
    assert_eq!(method.proto.shorty, "VJLF");
    assert_eq!(method.return_type(), "V");
    assert_eq!(method.param_types(), ["J", "[Ljava/lang/String;", "F"]);
    assert_eq!(method.spaced_param_types(false), vec![
        Some("Lcom/example/Point;".to_string()),
        Some("J".to_string()),
        None,
        Some("[Ljava/lang/String;".to_string()),
        Some("F".to_string()),
    ]);

    assert_eq!(dex.field_id(1).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
    assert_eq!(dex.method_id(7).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
    assert_eq!(dex.proto(3).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
}

#[test]
fn dex_file_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DexFile>();

    let dex = DexFile::from_vec(two_classes().build()).unwrap();
    std::thread::scope(|s| {
        for class in dex.classes() {
            let dex = &dex;
            s.spawn(move || class.parse_data(dex).map(|d| d.methods.len()).unwrap());
        }
    });
    assert!(dex.classes().iter().all(|c| c.is_parsed()));
}
