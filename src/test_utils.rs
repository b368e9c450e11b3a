use dicom_core::value::Value;
use dicom_core::VR;
use dicom_object::mem::InMemElement;
use dicom_object::meta::FileMetaTableBuilder;
use dicom_object::{DefaultDicomObject, FileDicomObject, FileMetaTable};

use crate::tags;

pub(crate) const SOP_CLASS_UID: &str = "1.2.840.10008.5.1.4.1.1.7";
pub(crate) const SOP_INSTANCE_UID: &str = "1.2.3.4.56";

pub(crate) fn make_file_meta() -> FileMetaTable {
    FileMetaTableBuilder::new()
        .media_storage_sop_class_uid(SOP_CLASS_UID)
        .media_storage_sop_instance_uid(SOP_INSTANCE_UID)
        .transfer_syntax("1.2.840.10008.1.2.1") // Explicit VR Little Endian
        .build()
        .unwrap()
}

/// An object whose meta header and data set agree on the SOP Instance UID.
pub(crate) fn make_object() -> DefaultDicomObject {
    let mut obj = FileDicomObject::new_empty_with_meta(make_file_meta());
    obj.put(InMemElement::new(
        tags::SOP_CLASS_UID,
        VR::UI,
        Value::from(SOP_CLASS_UID),
    ));
    obj.put(InMemElement::new(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        Value::from(SOP_INSTANCE_UID),
    ));
    obj
}
