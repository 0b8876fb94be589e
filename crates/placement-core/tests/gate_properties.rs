//! 권한 게이트 속성 테스트

use placement_core::auth::{authorize, resolve_college_scope};
use placement_core::{AuthError, Claims, Role};
use proptest::prelude::*;
use uuid::Uuid;

fn role_strategy() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn roles_strategy() -> impl Strategy<Value = Vec<Role>> {
    prop::sample::subsequence(Role::ALL.to_vec(), 0..=Role::ALL.len())
}

fn uuid_strategy() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn claims(role: Role, college_id: Option<Uuid>) -> Claims {
    Claims {
        sub: Uuid::new_v4().to_string(),
        username: "user".to_string(),
        role,
        college_id,
        iat: 0,
        exp: i64::MAX,
        jti: Uuid::new_v4().to_string(),
    }
}

proptest! {
    #[test]
    fn superadmin_allowed_for_any_college(resource in proptest::option::of(uuid_strategy())) {
        let root = claims(Role::SuperAdmin, None);
        prop_assert!(authorize(&root, &[Role::SuperAdmin], resource).is_ok());
    }

    #[test]
    fn role_outside_required_set_is_forbidden(
        role in role_strategy(),
        required in roles_strategy(),
        college in uuid_strategy(),
    ) {
        let token = claims(role, Some(college));
        let result = authorize(&token, &required, Some(college));
        if required.contains(&role) {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(AuthError::Forbidden)));
        }
    }

    #[test]
    fn non_superadmin_confined_to_own_college(
        role in prop::sample::select(vec![Role::Student, Role::Moderator, Role::Admin]),
        own in uuid_strategy(),
        other in uuid_strategy(),
    ) {
        prop_assume!(own != other);
        let token = claims(role, Some(own));

        prop_assert!(authorize(&token, &Role::ALL, Some(own)).is_ok());
        prop_assert!(authorize(&token, &Role::ALL, Some(other)).is_err());
        prop_assert_eq!(resolve_college_scope(&token, None).unwrap(), Some(own));
        prop_assert!(resolve_college_scope(&token, Some(other)).is_err());
    }
}

#[test]
fn moderator_of_college_a_denied_on_college_b() {
    let college_a = Uuid::new_v4();
    let college_b = Uuid::new_v4();
    let moderator = claims(Role::Moderator, Some(college_a));

    assert!(matches!(
        authorize(&moderator, &[Role::Moderator], Some(college_b)),
        Err(AuthError::Forbidden)
    ));
    assert!(authorize(&moderator, &[Role::Moderator], Some(college_a)).is_ok());
}
