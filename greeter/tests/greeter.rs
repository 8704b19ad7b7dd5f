//! End-to-end Greeter scenario: deploy the contract, register members into
//! the group, then submit a proof-backed anonymous greeting and check the
//! emitted events.

use ark_bn254::Bn254;
use ark_groth16::{ProvingKey, VerifyingKey};
use greeter::contract::{ContractError, Greeter, GreeterEvent};
use greeter::state::load_or_setup_keys;
use rand::rngs::OsRng;
use std::sync::OnceLock;
use zk_membership::constants::DEFAULT_TREE_DEPTH;
use zk_membership::group::Group;
use zk_membership::groth16::{
    external_nullifier_from_group_id, prove_membership, setup_keys, signal_hash,
    verify_membership_proof,
};
use zk_membership::identity::Identity;

const GROUP_ID: u64 = 42;

/// One trusted setup per test binary; tests share the artifacts the way a
/// deployment would.
fn keys() -> &'static (ProvingKey<Bn254>, VerifyingKey<Bn254>) {
    static KEYS: OnceLock<(ProvingKey<Bn254>, VerifyingKey<Bn254>)> = OnceLock::new();
    KEYS.get_or_init(|| setup_keys::<DEFAULT_TREE_DEPTH>(&mut OsRng).expect("trusted setup"))
}

struct User {
    identity: Identity,
    username: &'static str,
}

/// Deploy a greeter and register two users, mirroring the group off-chain as
/// a prover would. Returns the contract, the off-chain group and the users.
fn deploy_with_two_users() -> (Greeter, Group, Vec<User>) {
    let (_pk, vk) = keys();
    let mut greeter = Greeter::deploy(GROUP_ID, DEFAULT_TREE_DEPTH, vk.clone()).expect("deploy");

    let users = vec![
        User { identity: Identity::new(&mut OsRng), username: "anon1" },
        User { identity: Identity::new(&mut OsRng), username: "anon2" },
    ];

    let mut group = Group::new(DEFAULT_TREE_DEPTH).expect("group");
    for user in &users {
        group.add_member(user.identity.commitment()).expect("add member");
    }

    (greeter, group, users)
}

#[test]
fn proving_artifacts_are_generated_once_and_reloaded() {
    const DEPTH: usize = 4;
    let data_dir =
        std::env::temp_dir().join(format!("greeter-artifacts-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&data_dir);

    let generated = load_or_setup_keys::<DEPTH>(&data_dir).expect("generate");
    assert!(data_dir.join("keys").join("groth16_pk.bin").exists());
    assert!(data_dir.join("keys").join("groth16_vk.bin").exists());

    // A second call must deserialize the persisted artifacts; a fresh setup
    // would have produced different keys.
    let reloaded = load_or_setup_keys::<DEPTH>(&data_dir).expect("reload");
    assert_eq!(generated.vk.as_ref(), reloaded.vk.as_ref());
    assert_eq!(generated.pk.as_ref(), reloaded.pk.as_ref());

    // The reloaded proving key still produces proofs the verifying key accepts.
    let identity = Identity::new(&mut OsRng);
    let mut group = Group::new(DEPTH).expect("group");
    let index = group.add_member(identity.commitment()).expect("add member");
    let witness = group.merkle_witness(index).expect("witness");

    let (proof, inputs) = prove_membership::<DEPTH>(
        &mut OsRng,
        &reloaded.pk,
        &identity,
        &witness,
        external_nullifier_from_group_id(GROUP_ID),
        signal_hash(b"Hello World"),
    )
    .expect("prove");
    verify_membership_proof(&reloaded.vk, &proof, &inputs).expect("verify");

    let _ = std::fs::remove_dir_all(&data_dir);
}

#[test]
fn users_can_join_the_group() {
    let (mut greeter, group, users) = deploy_with_two_users();

    for (i, user) in users.iter().enumerate() {
        let commitment = group.members()[i];
        let (position, event) = greeter.join_group(commitment, user.username).expect("join");

        assert_eq!(position as usize, i);
        assert_eq!(
            event,
            GreeterEvent::NewUser {
                identity_commitment: commitment,
                username: user.username.to_string(),
            }
        );
    }

    // The contract's incremental tree must agree with the off-chain group.
    assert_eq!(greeter.merkle_root(), group.root());
    assert_eq!(greeter.member_count(), 2);
}

#[test]
fn a_member_can_greet_anonymously() {
    let (pk, _vk) = keys();
    let (mut greeter, group, users) = deploy_with_two_users();

    for (i, user) in users.iter().enumerate() {
        greeter.join_group(group.members()[i], user.username).expect("join");
    }

    let greeting = "Hello World";
    let witness = group.merkle_witness(1).expect("witness");
    let (proof, inputs) = prove_membership::<DEFAULT_TREE_DEPTH>(
        &mut OsRng,
        pk,
        &users[1].identity,
        &witness,
        external_nullifier_from_group_id(GROUP_ID),
        signal_hash(greeting.as_bytes()),
    )
    .expect("prove");

    let event = greeter
        .greet(greeting, inputs.merkle_root, inputs.nullifier_hash, &proof)
        .expect("greet");

    assert_eq!(event, GreeterEvent::NewGreeting { message: greeting.to_string() });
}

#[test]
fn a_nullifier_cannot_be_reused() {
    let (pk, _vk) = keys();
    let (mut greeter, group, users) = deploy_with_two_users();

    for (i, user) in users.iter().enumerate() {
        greeter.join_group(group.members()[i], user.username).expect("join");
    }

    let witness = group.merkle_witness(0).expect("witness");
    let external_nullifier = external_nullifier_from_group_id(GROUP_ID);

    let (proof, inputs) = prove_membership::<DEFAULT_TREE_DEPTH>(
        &mut OsRng,
        pk,
        &users[0].identity,
        &witness,
        external_nullifier,
        signal_hash(b"first"),
    )
    .expect("prove");
    greeter
        .greet("first", inputs.merkle_root, inputs.nullifier_hash, &proof)
        .expect("greet");

    // A fresh proof from the same identity carries the same nullifier hash
    // for this scope and must be rejected.
    let (proof2, inputs2) = prove_membership::<DEFAULT_TREE_DEPTH>(
        &mut OsRng,
        pk,
        &users[0].identity,
        &witness,
        external_nullifier,
        signal_hash(b"second"),
    )
    .expect("prove");

    assert!(matches!(
        greeter.greet("second", inputs2.merkle_root, inputs2.nullifier_hash, &proof2),
        Err(ContractError::NullifierAlreadyUsed)
    ));
}

#[test]
fn proofs_against_an_old_root_are_rejected() {
    let (pk, _vk) = keys();
    let (mut greeter, group, users) = deploy_with_two_users();

    for (i, user) in users.iter().enumerate() {
        greeter.join_group(group.members()[i], user.username).expect("join");
    }

    let witness = group.merkle_witness(1).expect("witness");
    let (proof, inputs) = prove_membership::<DEFAULT_TREE_DEPTH>(
        &mut OsRng,
        pk,
        &users[1].identity,
        &witness,
        external_nullifier_from_group_id(GROUP_ID),
        signal_hash(b"Hello World"),
    )
    .expect("prove");

    // A third member joins before the greeting lands; the root moves on.
    let late = Identity::new(&mut OsRng);
    greeter.join_group(late.commitment(), "anon3").expect("join");

    assert!(matches!(
        greeter.greet("Hello World", inputs.merkle_root, inputs.nullifier_hash, &proof),
        Err(ContractError::StaleRoot)
    ));
}

#[test]
fn the_message_is_bound_to_the_proof() {
    let (pk, _vk) = keys();
    let (mut greeter, group, users) = deploy_with_two_users();

    for (i, user) in users.iter().enumerate() {
        greeter.join_group(group.members()[i], user.username).expect("join");
    }

    let witness = group.merkle_witness(1).expect("witness");
    let (proof, inputs) = prove_membership::<DEFAULT_TREE_DEPTH>(
        &mut OsRng,
        pk,
        &users[1].identity,
        &witness,
        external_nullifier_from_group_id(GROUP_ID),
        signal_hash(b"Hello World"),
    )
    .expect("prove");

    // Same proof, different message: the signal hash no longer matches.
    assert!(matches!(
        greeter.greet("Goodbye World", inputs.merkle_root, inputs.nullifier_hash, &proof),
        Err(ContractError::InvalidProof)
    ));

    // The untampered submission still goes through.
    greeter
        .greet("Hello World", inputs.merkle_root, inputs.nullifier_hash, &proof)
        .expect("greet");
}
