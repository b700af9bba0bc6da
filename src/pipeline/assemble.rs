//! Document assembly: append single-page artifacts into one PDF.
//!
//! Each artifact is decoded, its object ids shifted past everything already
//! in the output, and its first page re-parented under a fresh page tree.
//! Attributes a page inherits from its old `Pages` node (`MediaBox`,
//! `Resources`, `CropBox`, `Rotate`) are copied onto the page first, so pages
//! of differing sizes keep their own geometry. Everything unreachable from
//! the new catalog is pruned before the single final serialisation.

use crate::error::Html2PdfError;
use crate::pipeline::capture::SlideArtifact;
use lopdf::{dictionary, Document, Object, ObjectId};
use tracing::{debug, info, warn};

/// Page attributes that may live on an ancestor `Pages` node.
const INHERITABLE: &[&[u8]] = &[b"MediaBox", b"Resources", b"CropBox", b"Rotate"];

/// Merge artifacts, in order, into one serialised PDF.
pub fn merge(artifacts: &[SlideArtifact]) -> Result<Vec<u8>, Html2PdfError> {
    if artifacts.is_empty() {
        return Err(Html2PdfError::MergeFailed("no slide artifacts to merge".into()));
    }

    let mut out = Document::with_version("1.5");
    let pages_id = out.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        let page_id = import_first_page(&mut out, artifact, pages_id)?;
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    out.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = out.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    out.trailer.set("Root", catalog_id);
    out.prune_objects();
    out.renumber_objects();
    out.compress();

    let mut buf = Vec::new();
    out.save_to(&mut buf)
        .map_err(|e| Html2PdfError::MergeFailed(format!("serialise: {e}")))?;
    info!("Merged {} page(s) into {} bytes", count, buf.len());
    Ok(buf)
}

/// Move `artifact`'s objects into `out` and hang its first page off `parent`.
fn import_first_page(
    out: &mut Document,
    artifact: &SlideArtifact,
    parent: ObjectId,
) -> Result<ObjectId, Html2PdfError> {
    let slide_num = artifact.index + 1;
    let merge_err = |detail: String| Html2PdfError::MergeFailed(format!("slide {slide_num}: {detail}"));

    let mut src = Document::load_mem(&artifact.bytes).map_err(|e| merge_err(e.to_string()))?;
    if src.is_encrypted() {
        return Err(merge_err("artifact is encrypted".into()));
    }

    src.renumber_objects_with(out.max_id + 1);
    let pages = src.get_pages();
    let page_id = match pages.values().next() {
        Some(id) => *id,
        None => return Err(merge_err("artifact has no pages".into())),
    };
    if pages.len() > 1 {
        warn!(
            "Slide {} rendered {} pages; keeping the first",
            slide_num,
            pages.len()
        );
    }

    let inherited: Vec<(&[u8], Object)> = {
        let page = src.get_dictionary(page_id).map_err(|e| merge_err(e.to_string()))?;
        INHERITABLE
            .iter()
            .filter(|key| !page.has(key))
            .filter_map(|key| inherited_attribute(&src, page, key).map(|v| (*key, v)))
            .collect()
    };
    let page = src
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| merge_err(e.to_string()))?;
    for (key, value) in inherited {
        debug!(
            "Slide {}: copying inherited {}",
            slide_num,
            String::from_utf8_lossy(key)
        );
        page.set(key.to_vec(), value);
    }
    page.set("Parent", parent);

    if src.max_id > out.max_id {
        out.max_id = src.max_id;
    }
    out.objects.extend(src.objects);
    Ok(page_id)
}

/// Walk up the `Parent` chain looking for `key`.
fn inherited_attribute(doc: &Document, page: &lopdf::Dictionary, key: &[u8]) -> Option<Object> {
    let mut next = page.get(b"Parent").and_then(Object::as_reference).ok();
    // Depth bound guards against cyclic page trees.
    for _ in 0..32 {
        let node = doc.get_dictionary(next?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        next = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::single_page_pdf;
    use lopdf::Stream;

    fn artifact(index: usize, w: f64, h: f64) -> SlideArtifact {
        SlideArtifact {
            index,
            bytes: single_page_pdf(w, h, &format!("slide {index}")),
        }
    }

    fn load(bytes: &[u8]) -> Document {
        let mut doc = Document::load_mem(bytes).unwrap();
        doc.decompress();
        doc
    }

    fn media_box(doc: &Document, page_id: ObjectId) -> (f32, f32) {
        let arr = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .clone();
        (arr[2].as_float().unwrap(), arr[3].as_float().unwrap())
    }

    #[test]
    fn k_artifacts_become_k_pages_in_order() {
        let artifacts: Vec<_> = (0..5).map(|i| artifact(i, 1440.0, 810.0)).collect();
        let doc = load(&merge(&artifacts).unwrap());
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 5);
        for (n, page_id) in pages.values().enumerate() {
            let content = String::from_utf8_lossy(&doc.get_page_content(*page_id).unwrap()).to_string();
            assert!(content.contains(&format!("(slide {n})")), "page {n}: {content}");
        }
    }

    #[test]
    fn differing_page_sizes_preserved() {
        let artifacts = vec![artifact(0, 1440.0, 810.0), artifact(1, 810.0, 1440.0)];
        let doc = load(&merge(&artifacts).unwrap());
        let ids: Vec<_> = doc.get_pages().values().copied().collect();
        assert_eq!(media_box(&doc, ids[0]), (1440.0, 810.0));
        assert_eq!(media_box(&doc, ids[1]), (810.0, 1440.0));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(merge(&[]), Err(Html2PdfError::MergeFailed(_))));
    }

    #[test]
    fn garbage_artifact_names_the_slide() {
        let artifacts = vec![
            artifact(0, 100.0, 100.0),
            SlideArtifact {
                index: 1,
                bytes: b"not a pdf".to_vec(),
            },
        ];
        match merge(&artifacts) {
            Err(Html2PdfError::MergeFailed(msg)) => assert!(msg.contains("slide 2"), "{msg}"),
            other => panic!("expected merge failure, got {other:?}"),
        }
    }

    /// A page whose MediaBox and Resources live on the Pages node.
    fn inherited_geometry_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"0 0 m".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 300.into(), 200.into()],
                "Resources" => dictionary! {},
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn inherited_attributes_copied_onto_page() {
        let artifacts = vec![
            SlideArtifact {
                index: 0,
                bytes: inherited_geometry_pdf(),
            },
            artifact(1, 50.0, 50.0),
        ];
        let doc = load(&merge(&artifacts).unwrap());
        let ids: Vec<_> = doc.get_pages().values().copied().collect();
        assert_eq!(media_box(&doc, ids[0]), (300.0, 200.0));
        assert!(doc.get_dictionary(ids[0]).unwrap().has(b"Resources"));
    }

    #[test]
    fn multi_page_artifact_keeps_first_page_only() {
        let mut doc = Document::load_mem(&single_page_pdf(100.0, 100.0, "first")).unwrap();
        // Append a second page to the same tree.
        let pages_id = doc.catalog().unwrap().get(b"Pages").unwrap().as_reference().unwrap();
        let extra = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 10.into(), 10.into()],
        });
        let pages = doc.get_object_mut(pages_id).unwrap().as_dict_mut().unwrap();
        pages.get_mut(b"Kids").unwrap().as_array_mut().unwrap().push(extra.into());
        pages.set("Count", 2);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let merged = load(&merge(&[SlideArtifact { index: 0, bytes }]).unwrap());
        assert_eq!(merged.get_pages().len(), 1);
    }
}
