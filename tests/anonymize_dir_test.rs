use dicom_core::header::Header;
use dicom_core::value::Value;
use dicom_core::{PrimitiveValue, Tag, VR};
use dicom_object::mem::InMemElement;
use dicom_object::meta::FileMetaTableBuilder;
use dicom_object::{open_file, DefaultDicomObject, FileDicomObject};
use dicom_scrub::batch::{anonymize_dir, default_output_root, BatchSummary};
use dicom_scrub::config::ConfigBuilder;
use dicom_scrub::policy::{REDACTED_TEXT, SENTINEL_DATE};
use dicom_scrub::tags;
use dicom_scrub::uid::is_valid_uid;
use dicom_scrub::{is_private_tag, Anonymizer};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn make_dicom_file(path: &Path, sop_instance_uid: &str, patient_name: &str) {
    let meta = FileMetaTableBuilder::new()
        .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
        .media_storage_sop_instance_uid(sop_instance_uid)
        .transfer_syntax("1.2.840.10008.1.2.1")
        .build()
        .unwrap();

    let mut obj = FileDicomObject::new_empty_with_meta(meta);
    obj.put(InMemElement::new(
        tags::SOP_CLASS_UID,
        VR::UI,
        Value::from("1.2.840.10008.5.1.4.1.1.7"),
    ));
    obj.put(InMemElement::new(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        Value::from(sop_instance_uid),
    ));
    obj.put(InMemElement::new(
        tags::PATIENT_NAME,
        VR::PN,
        Value::from(patient_name),
    ));
    obj.put(InMemElement::new(
        tags::PATIENT_BIRTH_DATE,
        VR::DA,
        Value::from("19850604"),
    ));
    obj.put(InMemElement::new(
        tags::MODALITY,
        VR::CS,
        Value::from("OT"),
    ));
    obj.put(InMemElement::new(
        Tag(0x0009, 0x0010),
        VR::LO,
        Value::from("ACME 1.1"),
    ));
    obj.put(InMemElement::new(
        Tag(0x0009, 0x1001),
        VR::US,
        PrimitiveValue::from(42_u16),
    ));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    obj.write_to_file(path).unwrap();
}

fn text(obj: &DefaultDicomObject, tag: Tag) -> String {
    obj.element(tag)
        .unwrap()
        .to_str()
        .unwrap()
        .trim_end_matches('\0')
        .to_string()
}

#[test]
fn test_anonymize_directory_tree() {
    let dir = tempdir().unwrap();
    let input_root = dir.path().join("input");
    make_dicom_file(&input_root.join("a.dcm"), "1.2.3.4.10", "Doe^Jane");
    make_dicom_file(&input_root.join("study").join("b.dcm"), "1.2.3.4.20", "Doe^John");
    fs::write(input_root.join("README.txt"), "not a DICOM file").unwrap();

    let output_root = default_output_root(&input_root);
    let anonymizer = Anonymizer::from_config(ConfigBuilder::new().build());

    let summary = anonymize_dir(&anonymizer, &input_root, &output_root, true).unwrap();

    assert_eq!(
        summary,
        BatchSummary {
            attempted: 3,
            anonymized: 2,
            skipped: 1,
            malformed: 0,
            failed: 0,
        }
    );
    assert!(!output_root.join("README.txt").exists());

    let mut sop_instance_uids = Vec::new();
    for relative in ["a.dcm", "study/b.dcm"] {
        let obj = open_file(output_root.join(relative)).unwrap();

        assert_eq!(text(&obj, tags::PATIENT_NAME), REDACTED_TEXT);
        assert_eq!(text(&obj, tags::PATIENT_BIRTH_DATE), SENTINEL_DATE);
        assert_eq!(text(&obj, tags::MODALITY), "OT");
        assert!(obj.iter().all(|elem| !is_private_tag(&elem.tag())));

        let sop_instance_uid = text(&obj, tags::SOP_INSTANCE_UID);
        assert!(is_valid_uid(&sop_instance_uid));
        assert!(sop_instance_uid.starts_with("9999."));
        assert_eq!(
            obj.meta().media_storage_sop_instance_uid.trim_end_matches('\0'),
            sop_instance_uid
        );
        sop_instance_uids.push(sop_instance_uid);
    }
    assert_ne!(sop_instance_uids[0], sop_instance_uids[1]);
}

#[test]
fn test_rerun_does_not_process_previous_output() {
    let dir = tempdir().unwrap();
    let input_root = dir.path().to_path_buf();
    make_dicom_file(&input_root.join("a.dcm"), "1.2.3.4.10", "Doe^Jane");

    let output_root = default_output_root(&input_root);
    let anonymizer = Anonymizer::default();

    let first = anonymize_dir(&anonymizer, &input_root, &output_root, true).unwrap();
    let second = anonymize_dir(&anonymizer, &input_root, &output_root, true).unwrap();

    assert_eq!(first.attempted, 1);
    assert_eq!(second.attempted, 1);
    assert_eq!(second.anonymized, 1);
    assert!(!output_root.join("anonymized").exists());
}

#[test]
fn test_empty_selection_keeps_public_tags() {
    let dir = tempdir().unwrap();
    let input_root = dir.path().join("input");
    let output_root = dir.path().join("output");
    make_dicom_file(&input_root.join("a.dcm"), "1.2.3.4.10", "Doe^Jane");

    let config = ConfigBuilder::new()
        .selection(Default::default())
        .build();
    let anonymizer = Anonymizer::from_config(config);

    let summary = anonymize_dir(&anonymizer, &input_root, &output_root, false).unwrap();
    assert_eq!(summary.anonymized, 1);

    let obj = open_file(output_root.join("a.dcm")).unwrap();
    assert_eq!(text(&obj, tags::PATIENT_NAME), "Doe^Jane");
    assert_eq!(text(&obj, tags::PATIENT_BIRTH_DATE), "19850604");
    assert_eq!(text(&obj, tags::SOP_INSTANCE_UID), "1.2.3.4.10");
    assert!(obj.element(Tag(0x0009, 0x0010)).is_err());
    assert!(obj.element(Tag(0x0009, 0x1001)).is_err());
}

#[test]
fn test_uncreatable_output_root_aborts() {
    let dir = tempdir().unwrap();
    let input_root = dir.path().join("input");
    make_dicom_file(&input_root.join("a.dcm"), "1.2.3.4.10", "Doe^Jane");

    // a regular file where the output directory should go
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "occupied").unwrap();

    let result = anonymize_dir(
        &Anonymizer::default(),
        &input_root,
        &blocker.join("output"),
        true,
    );
    assert!(result.is_err());
}

#[test]
fn test_truncated_file_is_counted_as_malformed() {
    let dir = tempdir().unwrap();
    let input_root = dir.path().join("input");
    let output_root = dir.path().join("output");
    make_dicom_file(&input_root.join("a.dcm"), "1.2.3.4.10", "Doe^Jane");
    make_dicom_file(&input_root.join("b.dcm"), "1.2.3.4.20", "Doe^John");
    fs::write(input_root.join("notes.txt"), "not a DICOM file").unwrap();

    // cut the last element short
    let truncated = input_root.join("b.dcm");
    let bytes = fs::read(&truncated).unwrap();
    fs::write(&truncated, &bytes[..bytes.len() - 3]).unwrap();

    let summary = anonymize_dir(&Anonymizer::default(), &input_root, &output_root, false).unwrap();

    assert_eq!(
        summary,
        BatchSummary {
            attempted: 3,
            anonymized: 1,
            skipped: 1,
            malformed: 1,
            failed: 0,
        }
    );
    assert!(output_root.join("a.dcm").exists());
    assert!(!output_root.join("b.dcm").exists());
}
