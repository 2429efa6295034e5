use crate::DAI;
use srcfetch::{
    ChainId, Download, Error, FetchError, FileOutcome, MaterializationPolicy, MaterializeError,
    ResolveError, Resolver, SourceBundle, SourceProvider,
};
use srcfetch_config::ChainRegistry;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Serves a fixed bundle and records every lookup.
#[derive(Debug, Default)]
struct StaticProvider {
    bundle: Option<SourceBundle>,
    calls: Mutex<Vec<(String, ChainId)>>,
}

impl StaticProvider {
    fn new(bundle: SourceBundle) -> Self {
        Self { bundle: Some(bundle), calls: Default::default() }
    }

    fn calls(&self) -> Vec<(String, ChainId)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SourceProvider for StaticProvider {
    async fn fetch(&self, address: &str, chain: &ChainId) -> Result<SourceBundle, FetchError> {
        self.calls.lock().unwrap().push((address.to_string(), chain.clone()));
        self.bundle
            .clone()
            .ok_or_else(|| FetchError::NotFound { address: address.to_string(), chain: chain.clone() })
    }
}

fn resolver() -> Resolver {
    Resolver::new(ChainRegistry::new([("etherscan.io", 1), ("arbiscan.io", 42161)]), "contract.tools")
}

fn sample_bundle() -> SourceBundle {
    SourceBundle {
        contract_name: Some("Dai".into()),
        files: BTreeMap::from([
            ("A.sol".into(), "content1".into()),
            ("dir/B.sol".into(), "content2".into()),
        ]),
        remappings: vec![Some("@x/=lib/x/".into())],
    }
}

/// Returns every file below `root` with its content, keyed by relative path.
fn read_tree(root: &Path) -> BTreeMap<String, String> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<String, String>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let relative = path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
                out.insert(relative, std::fs::read_to_string(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

async fn download(
    provider: &StaticProvider,
    reference: &str,
    directory: PathBuf,
    policy: MaterializationPolicy,
) -> Result<srcfetch::Downloaded, Error> {
    let default_chain = ChainId::default();
    Download { reference, default_chain: &default_chain, directory: Some(directory), policy }
        .run(&resolver(), provider)
        .await
}

#[tokio::test]
async fn round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = StaticProvider::new(sample_bundle());

    let downloaded =
        download(&provider, DAI, tmp.path().to_path_buf(), MaterializationPolicy::Strict)
            .await
            .unwrap();
    assert_eq!(downloaded.report.written(), 3);
    assert_eq!(downloaded.contract_name.as_deref(), Some("Dai"));

    let expected = BTreeMap::from([
        ("A.sol".to_string(), "content1".to_string()),
        ("dir/B.sol".to_string(), "content2".to_string()),
        ("remappings.txt".to_string(), "@x/=lib/x/".to_string()),
    ]);
    similar_asserts::assert_eq!(read_tree(tmp.path()), expected);
}

#[tokio::test]
async fn bare_address_uses_default_chain() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = StaticProvider::new(sample_bundle());

    let downloaded = Download {
        reference: DAI,
        default_chain: &ChainId::Id(10),
        directory: Some(tmp.path().join("out")),
        policy: MaterializationPolicy::Strict,
    }
    .run(&resolver(), &provider)
    .await
    .unwrap();
    assert_eq!(downloaded.chain, ChainId::Id(10));
    assert_eq!(provider.calls(), vec![(DAI.to_string(), ChainId::Id(10))]);
}

#[tokio::test]
async fn url_chain_wins_over_default() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = StaticProvider::new(sample_bundle());

    download(
        &provider,
        &format!("https://arbiscan.io/address/{DAI}#code"),
        tmp.path().join("explorer"),
        MaterializationPolicy::Strict,
    )
    .await
    .unwrap();
    download(
        &provider,
        &format!("https://contract.tools/optimism/{DAI}"),
        tmp.path().join("aggregator"),
        MaterializationPolicy::Strict,
    )
    .await
    .unwrap();

    assert_eq!(
        provider.calls(),
        vec![
            (DAI.to_string(), ChainId::Id(42161)),
            (DAI.to_string(), ChainId::Named("optimism".into())),
        ]
    );
}

#[tokio::test]
async fn merge_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = StaticProvider::new(sample_bundle());

    download(&provider, DAI, tmp.path().to_path_buf(), MaterializationPolicy::Merge).await.unwrap();
    let before = read_tree(tmp.path());

    let second = download(&provider, DAI, tmp.path().to_path_buf(), MaterializationPolicy::Merge)
        .await
        .unwrap();
    assert_eq!(second.report.unchanged(), 3);
    assert_eq!(second.report.written(), 0);
    assert!(second.report.outcomes.iter().all(|o| matches!(o, FileOutcome::Unchanged(_))));
    similar_asserts::assert_eq!(read_tree(tmp.path()), before);
}

#[tokio::test]
async fn merge_keeps_both_versions_on_conflict() {
    let tmp = tempfile::tempdir().unwrap();
    let first = StaticProvider::new(sample_bundle());
    download(&first, DAI, tmp.path().to_path_buf(), MaterializationPolicy::Merge).await.unwrap();

    let mut changed = sample_bundle();
    changed.files.insert("A.sol".into(), "changed".into());
    let second = StaticProvider::new(changed);
    let downloaded = download(&second, DAI, tmp.path().to_path_buf(), MaterializationPolicy::Merge)
        .await
        .unwrap();

    let conflicts: Vec<_> = downloaded
        .report
        .conflicts()
        .map(|(original, written)| (original.to_path_buf(), written.to_path_buf()))
        .collect();
    assert_eq!(conflicts, vec![(tmp.path().join("A.sol"), tmp.path().join("A.conflict1.sol"))]);

    let tree = read_tree(tmp.path());
    assert_eq!(tree["A.sol"], "content1");
    assert_eq!(tree["A.conflict1.sol"], "changed");
    assert_eq!(tree.len(), 4);
}

#[tokio::test]
async fn strict_leaves_non_empty_destination_untouched() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join(".hidden"), "keep").unwrap();
    let provider = StaticProvider::new(sample_bundle());

    let err = download(&provider, DAI, tmp.path().to_path_buf(), MaterializationPolicy::Strict)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Materialize(MaterializeError::DestinationNotEmpty(_))));
    similar_asserts::assert_eq!(
        read_tree(tmp.path()),
        BTreeMap::from([(".hidden".to_string(), "keep".to_string())])
    );
}

#[tokio::test]
async fn resolution_failure_skips_fetch() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = StaticProvider::new(sample_bundle());

    let err = download(
        &provider,
        &format!("https://unknown.example/address/{DAI}"),
        tmp.path().join("out"),
        MaterializationPolicy::Strict,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Resolve(ResolveError::UnsupportedDomain(_))));
    assert!(provider.calls().is_empty());
    assert!(!tmp.path().join("out").exists());
}

#[tokio::test]
async fn not_found_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = StaticProvider::default();

    let err = download(&provider, DAI, tmp.path().join("out"), MaterializationPolicy::Strict)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Fetch(FetchError::NotFound { .. })));
    assert!(!tmp.path().join("out").exists());
}
