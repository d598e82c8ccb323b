use url::Url;

use crate::storage::{StorageError, StoragePath};

/// Maps a public object url back to its bucket-relative path.
pub trait StoragePathResolver: Send + Sync {
    fn resolve_storage_path(&self, url: &str) -> Option<StoragePath>;
}

/// Locates the first path segment equal to the bucket name and treats
/// everything after it as the object key.
#[derive(Clone, Debug)]
pub struct BucketSegmentResolver {
    bucket: String,
}

impl BucketSegmentResolver {
    pub fn new<S: Into<String>>(bucket: S) -> Self {
        Self {
            bucket: bucket.into(),
        }
    }
}

impl StoragePathResolver for BucketSegmentResolver {
    fn resolve_storage_path(&self, url: &str) -> Option<StoragePath> {
        let url = Url::parse(url).ok()?;
        let mut segments = url.path_segments()?;
        segments.find(|segment| decode_segment(segment).as_deref() == Some(self.bucket.as_str()))?;
        let rest = segments.map(decode_segment).collect::<Option<Vec<_>>>()?;
        StoragePath::from_segments(rest).ok()
    }
}

fn decode_segment(segment: &str) -> Option<String> {
    urlencoding::decode(segment)
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// Builds `<base>/<bucket>/<path>` with every segment percent-encoded.
pub fn public_url(base: &Url, bucket: &str, path: &StoragePath) -> Result<String, StorageError> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| StorageError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
        segments.pop_if_empty().push(bucket).extend(path.segments());
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUCKET: &str = "resource-files";

    fn resolve(url: &str) -> Option<String> {
        BucketSegmentResolver::new(BUCKET)
            .resolve_storage_path(url)
            .map(|p| p.to_string())
    }

    #[test]
    fn resolves_hosted_object_url() {
        assert_eq!(
            resolve("https://abc.supabase.co/storage/v1/object/public/resource-files/public/42/notes.pdf")
                .as_deref(),
            Some("public/42/notes.pdf")
        );
    }

    #[test]
    fn decodes_escaped_segments() {
        assert_eq!(
            resolve("http://localhost:8080/files/resource-files/public/42/Lecture%201.pdf").as_deref(),
            Some("public/42/Lecture 1.pdf")
        );
    }

    #[test]
    fn ignores_query_and_fragment() {
        assert_eq!(
            resolve("http://localhost/files/resource-files/public/42/a.pdf?download=1#page=2")
                .as_deref(),
            Some("public/42/a.pdf")
        );
    }

    #[test]
    fn missing_bucket_segment_is_unresolved() {
        assert_eq!(
            resolve("https://placehold.co/downloadable/PHY301_Quantum_Intro.pdf"),
            None
        );
        // bucket name only as a substring of another segment
        assert_eq!(resolve("https://cdn.example.org/my-resource-files/a.pdf"), None);
    }

    #[test]
    fn nothing_after_bucket_is_unresolved() {
        assert_eq!(resolve("https://cdn.example.org/files/resource-files"), None);
        assert_eq!(resolve("https://cdn.example.org/files/resource-files/"), None);
    }

    #[test]
    fn garbage_url_is_unresolved() {
        assert_eq!(resolve("not a url"), None);
        assert_eq!(resolve(""), None);
        assert_eq!(resolve("/files/resource-files/public/a.pdf"), None);
    }

    #[test]
    fn public_url_round_trips_through_resolver() {
        let base = Url::parse("http://localhost:8080/files/").unwrap();
        let path = StoragePath::new("public/42/Lecture 1 (draft).pdf").unwrap();
        let url = public_url(&base, BUCKET, &path).unwrap();
        assert_eq!(
            url,
            "http://localhost:8080/files/resource-files/public/42/Lecture%201%20(draft).pdf"
        );
        assert_eq!(resolve(&url).as_deref(), Some(path.as_str()));
    }
}
