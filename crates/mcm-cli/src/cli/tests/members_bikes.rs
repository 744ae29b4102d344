//! Tests for member and bike subcommands.

use super::{parse, parse_err};
use crate::cli::{BikeCommand, CliCommand, MemberCommand};

#[test]
fn cli_parse_member_list_defaults() {
    match parse(&["mcm", "member", "list"]) {
        CliCommand::Member(MemberCommand::List { list }) => {
            assert!(list.search.is_none());
            assert!(list.sort.is_none());
            assert!(!list.desc);
            assert_eq!(list.page, 1);
            assert!(list.per_page.is_none());
        }
        other => panic!("expected member list, got {other:?}"),
    }
}

#[test]
fn cli_parse_member_list_options() {
    match parse(&[
        "mcm", "member", "list", "-s", "ana", "--sort", "joined", "--desc", "--page", "3",
        "--per-page", "5",
    ]) {
        CliCommand::Member(MemberCommand::List { list }) => {
            assert_eq!(list.search.as_deref(), Some("ana"));
            assert_eq!(list.sort.as_deref(), Some("joined"));
            assert!(list.desc);
            assert_eq!(list.page, 3);
            assert_eq!(list.per_page, Some(5));
        }
        other => panic!("expected member list, got {other:?}"),
    }
}

#[test]
fn cli_parse_member_add() {
    match parse(&[
        "mcm",
        "member",
        "add",
        "Ana",
        "Lopez",
        "--email",
        "ana@club.test",
    ]) {
        CliCommand::Member(MemberCommand::Add {
            first_name,
            last_name,
            email,
            phone,
            joined_at,
        }) => {
            assert_eq!(first_name, "Ana");
            assert_eq!(last_name, "Lopez");
            assert_eq!(email.as_deref(), Some("ana@club.test"));
            assert!(phone.is_none());
            assert!(joined_at.is_none());
        }
        other => panic!("expected member add, got {other:?}"),
    }
}

#[test]
fn cli_parse_member_status_and_roles() {
    match parse(&["mcm", "member", "deactivate", "7"]) {
        CliCommand::Member(MemberCommand::Deactivate { id }) => assert_eq!(id, 7),
        other => panic!("expected deactivate, got {other:?}"),
    }
    match parse(&["mcm", "member", "grant", "7", "treasurer"]) {
        CliCommand::Member(MemberCommand::Grant { id, role }) => {
            assert_eq!(id, 7);
            assert_eq!(role, "treasurer");
        }
        other => panic!("expected grant, got {other:?}"),
    }
}

#[test]
fn cli_parse_member_requires_id() {
    parse_err(&["mcm", "member", "remove"]);
    parse_err(&["mcm", "member", "remove", "seven"]);
}

#[test]
fn cli_parse_bike_add() {
    match parse(&[
        "mcm", "bike", "add", "3", "Ducati", "Monster", "--year", "2019",
    ]) {
        CliCommand::Bike(BikeCommand::Add {
            member,
            brand,
            model,
            year,
            plate,
        }) => {
            assert_eq!(member, 3);
            assert_eq!(brand, "Ducati");
            assert_eq!(model, "Monster");
            assert_eq!(year, Some(2019));
            assert!(plate.is_none());
        }
        other => panic!("expected bike add, got {other:?}"),
    }
}
