//! LocalCircuitProver against fake prover scripts and a temp circuit tree.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use serde_json::json;
use spool_core::{ProofInputs, ProofType, ZkProof};
use spool_zkp::{LocalCircuitProver, ProverConfig, ProverError, ZkProver};
use tempfile::TempDir;

/// Proves by embedding its input; verifies by requiring the public inputs
/// (a one-entry object, or empty) to appear in the embedded input. Every
/// invocation is logged.
const HAPPY_PROVER: &str = r#"echo "$1" >> "$(dirname "$0")/calls.log"
case "$1" in
  prove)
    [ -f "$2" ] || { echo "no proving key" >&2; exit 3; }
    printf '{"pi_a":["1","2"],"input":%s}' "$(cat "$3")" > "$4"
    printf '["42","7"]' > "$5"
    ;;
  verify)
    [ -f "$2" ] || exit 3
    grep -q pi_a "$4" || exit 1
    entry=$(sed -e 's/^{//' -e 's/}$//' "$3")
    grep -qF "$entry" "$4" || exit 1
    ;;
  *) exit 2 ;;
esac"#;

struct Fixture {
    dir: TempDir,
    config: ProverConfig,
}

impl Fixture {
    /// Circuit tree with `kyc_tier` artifacts, the given prover script,
    /// and a dedicated scratch parent.
    fn new(script: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let circuit = dir.path().join("circuits").join("kyc_tier");
        std::fs::create_dir_all(&circuit).unwrap();
        std::fs::write(circuit.join("circuit.zkey"), b"pk").unwrap();
        std::fs::write(circuit.join("verification_key.json"), b"{}").unwrap();
        std::fs::create_dir(dir.path().join("scratch")).unwrap();
        let binary = write_script(dir.path(), "prover", script);

        let mut config = ProverConfig {
            circuits_dir: dir.path().join("circuits"),
            prover_binary: binary,
            scratch_dir: Some(dir.path().join("scratch")),
            timeout_secs: 10,
            ..ProverConfig::default()
        };
        config
            .verifiers
            .insert(ProofType::KycTier, "0x00000000000000000000000000000000000000aa".into());
        Self { dir, config }
    }

    fn prover(&self) -> LocalCircuitProver {
        LocalCircuitProver::new(self.config.clone()).unwrap()
    }

    fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.dir.path().join("scratch")).unwrap().count()
    }

    fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("calls.log"))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn inputs(pairs: &[(&str, serde_json::Value)]) -> ProofInputs {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn unsigned_proof(proof_type: ProofType, created_at: chrono::DateTime<Utc>) -> ZkProof {
    ZkProof {
        proof_type,
        proof: br#"{"pi_a":["1"]}"#.to_vec(),
        public_inputs: ProofInputs::new(),
        verifier_address: String::new(),
        created_at,
        expires_at: created_at + Duration::days(90),
        metadata: inputs(&[("public_signals", json!(["42"]))]),
    }
}

#[tokio::test]
async fn generated_proof_carries_signals_and_verifies() {
    let f = Fixture::new(HAPPY_PROVER);
    let p = f.prover();
    let private = inputs(&[("secret", json!(123))]);
    let public = inputs(&[("tier", json!(2))]);

    let proof = p.generate_proof(ProofType::KycTier, &private, &public).await.unwrap();
    assert_eq!(proof.proof_type, ProofType::KycTier);
    assert_eq!(proof.public_inputs, public);
    assert_eq!(proof.verifier_address, "0x00000000000000000000000000000000000000aa");
    assert_eq!(proof.expires_at - proof.created_at, Duration::days(90));
    assert_eq!(proof.metadata["public_signals"], json!(["42", "7"]));
    assert_eq!(proof.metadata_str("circuit"), Some("kyc_tier"));
    assert_eq!(proof.metadata_str("provider"), Some("local-circuit"));

    let body: serde_json::Value = serde_json::from_slice(&proof.proof).unwrap();
    assert_eq!(body["input"], json!({ "secret": 123, "tier": 2 }));

    assert!(p.verify_proof(&proof).await.unwrap());
    assert_eq!(f.calls(), vec!["prove", "verify"]);
    assert_eq!(f.scratch_entries(), 0);
}

#[tokio::test]
async fn tampered_proof_is_rejected() {
    let f = Fixture::new(HAPPY_PROVER);
    let p = f.prover();
    let mut proof = p
        .generate_proof(ProofType::KycTier, &ProofInputs::new(), &ProofInputs::new())
        .await
        .unwrap();
    proof.proof = b"{}".to_vec();
    assert!(!p.verify_proof(&proof).await.unwrap());
    assert_eq!(f.scratch_entries(), 0);
}

#[tokio::test]
async fn altered_public_inputs_are_rejected() {
    let f = Fixture::new(HAPPY_PROVER);
    let p = f.prover();
    let public = inputs(&[("tier", json!(1))]);
    let proof = p
        .generate_proof(ProofType::KycTier, &ProofInputs::new(), &public)
        .await
        .unwrap();
    assert!(p.verify_proof(&proof).await.unwrap());

    let mut raised = proof.clone();
    raised.public_inputs.insert("tier".into(), json!(3));
    assert!(!p.verify_proof(&raised).await.unwrap());

    let mut relabelled = proof;
    relabelled.metadata.insert("public_signals".into(), json!(["3"]));
    assert!(p.verify_proof(&relabelled).await.unwrap());
    assert_eq!(f.scratch_entries(), 0);
}

#[tokio::test]
async fn unmapped_type_fails_before_any_subprocess() {
    let mut f = Fixture::new(HAPPY_PROVER);
    f.config.circuits.clear();
    let p = f.prover();

    let result = p
        .generate_proof(ProofType::Transfer, &ProofInputs::new(), &ProofInputs::new())
        .await;
    assert!(matches!(
        result,
        Err(ProverError::UnmappedProofType {
            proof_type: ProofType::Transfer,
            ..
        })
    ));
    assert!(f.calls().is_empty());
    assert_eq!(f.scratch_entries(), 0);
}

#[tokio::test]
async fn timeout_is_reported_and_scratch_is_removed() {
    let mut f = Fixture::new("exec sleep 5");
    f.config.timeout_secs = 1;
    let p = f.prover();

    let result = p
        .generate_proof(ProofType::KycTier, &ProofInputs::new(), &ProofInputs::new())
        .await;
    assert!(matches!(
        result,
        Err(ProverError::ProverTimeout {
            operation: "prove",
            timeout_secs: 1,
            ..
        })
    ));
    assert_eq!(f.scratch_entries(), 0);
}

#[tokio::test]
async fn nonzero_exit_surfaces_stderr() {
    let f = Fixture::new(r#"echo "constraint 3 unsatisfied" >&2; exit 2"#);
    match f
        .prover()
        .generate_proof(ProofType::KycTier, &ProofInputs::new(), &ProofInputs::new())
        .await
    {
        Err(ProverError::ProverExecution { code, stderr, .. }) => {
            assert_eq!(code, Some(2));
            assert!(stderr.contains("constraint 3 unsatisfied"));
        }
        other => panic!("expected ProverExecution, got {other:?}"),
    }
    assert_eq!(f.scratch_entries(), 0);
}

#[tokio::test]
async fn missing_verification_key_is_never_valid() {
    let f = Fixture::new(HAPPY_PROVER);
    std::fs::remove_file(f.dir.path().join("circuits/kyc_tier/verification_key.json")).unwrap();

    let result = f.prover().verify_proof(&unsigned_proof(ProofType::KycTier, Utc::now())).await;
    assert!(matches!(result, Err(ProverError::CircuitArtifactMissing { .. })));
    assert!(f.calls().is_empty());
}

#[tokio::test]
async fn expired_proof_is_false_without_running_the_prover() {
    let f = Fixture::new(HAPPY_PROVER);
    let stale = unsigned_proof(ProofType::KycTier, Utc::now() - Duration::days(120));
    assert!(!f.prover().verify_proof(&stale).await.unwrap());
    assert!(f.calls().is_empty());
}

#[tokio::test]
async fn unstartable_verifier_is_an_execution_error() {
    let mut f = Fixture::new(HAPPY_PROVER);
    f.config.prover_binary = f.dir.path().join("missing-prover");

    let result = f.prover().verify_proof(&unsigned_proof(ProofType::KycTier, Utc::now())).await;
    assert!(matches!(
        result,
        Err(ProverError::ProverExecution {
            code: None,
            operation: "verify",
            ..
        })
    ));
    assert_eq!(f.scratch_entries(), 0);
}
