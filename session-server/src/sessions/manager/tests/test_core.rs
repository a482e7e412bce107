use super::*;

#[test]
fn test_open_session() {
    let manager = create_test_manager();

    let session_id = open_session(&manager, "T1");

    let snapshot = snapshot(&manager, &session_id);
    assert_eq!(snapshot.status, SessionStatus::Active);
    assert_eq!(snapshot.table_id, "T1");
    assert_eq!(snapshot.restaurant_id, RESTAURANT);
    assert!(!snapshot.bill.bill_id.is_empty());
    assert_eq!(snapshot.last_sequence, 1);
    assert!(snapshot.verify_checksum());
}

#[test]
fn test_idempotency() {
    let manager = create_test_manager();
    let cmd = command(
        Role::Waiter,
        SessionCommandPayload::OpenSession {
            table_id: "T1".to_string(),
        },
    );

    let first = manager.execute_command(cmd.clone());
    assert!(first.success);

    // Retried after a timeout
    let second = manager.execute_command(cmd);
    assert_eq!(second, first);
    assert!(second.session_id.is_some());

    assert_eq!(manager.get_active_sessions(RESTAURANT).unwrap().len(), 1);
    assert_eq!(manager.get_current_sequence().unwrap(), 1);
}

#[test]
fn test_retried_command_replays_original_response() {
    let manager = create_test_manager();
    let session_id = open_with_items(&manager, "T1", &[("menu", dec!(20.00), 1)]);

    let add = command(
        Role::Waiter,
        SessionCommandPayload::AddItem {
            session_id: session_id.clone(),
            item: item_input("tea", dec!(5.00), 2),
        },
    );
    let first = manager.execute_command(add.clone());
    let retried = manager.execute_command(add);
    assert!(retried.item_id.is_some());
    assert_eq!(retried.item_id, first.item_id);

    let pay_cmd = command(
        Role::Cashier,
        SessionCommandPayload::ProcessPayment {
            session_id: session_id.clone(),
            payment: PaymentRequest::Single {
                method: PaymentMethod::Pos,
                amount: dec!(12.00),
            },
        },
    );
    let first = manager.execute_command(pay_cmd.clone());
    let retried = manager.execute_command(pay_cmd);
    let outcome = retried.payment.as_ref().unwrap();
    assert_eq!(outcome.remaining, dec!(18.00));
    assert!(!outcome.fully_paid);
    assert_eq!(retried, first);

    let snapshot = snapshot(&manager, &session_id);
    assert_eq!(snapshot.items.len(), 2);
    assert_eq!(snapshot.transactions.len(), 1);
    assert_eq!(snapshot.bill.paid_amount, dec!(12.00));
}

#[test]
fn test_one_active_session_per_table() {
    let manager = create_test_manager();
    let first = open_session(&manager, "T1");

    let resp = run(
        &manager,
        Role::Guest,
        SessionCommandPayload::OpenSession {
            table_id: "T1".to_string(),
        },
    );
    assert_eq!(error_code(&resp), CommandErrorCode::TableOccupied);
    assert!(resp.error.unwrap().suggestion.is_some());

    // Closing frees the table
    let resp = run(
        &manager,
        Role::Waiter,
        SessionCommandPayload::CloseSession {
            session_id: first.clone(),
            force: false,
            reason: None,
        },
    );
    assert!(resp.success);

    let second = open_session(&manager, "T1");
    assert_ne!(first, second);
    let active = manager.get_active_session_for_table(RESTAURANT, "T1").unwrap();
    assert_eq!(active.unwrap().session_id, second);
}

#[test]
fn test_other_restaurant_cannot_see_session() {
    let manager = create_test_manager();
    let session_id = open_session(&manager, "T1");

    let cmd = SessionCommand::new(
        "r-2",
        "waiter-9",
        "Intruder",
        Role::Waiter,
        SessionCommandPayload::ConfirmPending {
            session_id: session_id.clone(),
        },
    );
    let resp = manager.execute_command(cmd);
    assert_eq!(error_code(&resp), CommandErrorCode::SessionNotFound);
    assert!(manager.get_session("r-2", &session_id).unwrap().is_none());
    assert!(manager.get_active_sessions("r-2").unwrap().is_empty());
}

#[test]
fn test_add_item_returns_server_id() {
    let manager = create_test_manager();
    let session_id = open_session(&manager, "T1");

    let mut input = item_input("soup", dec!(6.50), 2);
    input.client_ref = Some("tmp-1".to_string());
    let item_id = add_item(&manager, &session_id, Role::Guest, input);

    let snapshot = snapshot(&manager, &session_id);
    let line = snapshot.find_item(&item_id).unwrap();
    assert_eq!(line.status, ItemStatus::Draft);
    assert_eq!(line.client_ref.as_deref(), Some("tmp-1"));
    assert_eq!(line.created_by, "guest-1");
    // Drafts are not billed until sent
    assert_eq!(snapshot.bill.total_amount, Decimal::ZERO);
}

#[test]
fn test_add_then_remove_pending_is_round_trip() {
    let manager = create_test_manager();
    let session_id = open_with_items(&manager, "T1", &[("bread", dec!(2.00), 1)]);
    let before = snapshot(&manager, &session_id);

    let item_id = add_item(
        &manager,
        &session_id,
        Role::Waiter,
        item_input("water", dec!(1.50), 1),
    );
    let resp = run(
        &manager,
        Role::Waiter,
        SessionCommandPayload::RemoveItem {
            session_id: session_id.clone(),
            item_id,
        },
    );
    assert!(resp.success);

    let after = snapshot(&manager, &session_id);
    assert_eq!(after.items, before.items);
    assert_eq!(after.bill.total_amount, before.bill.total_amount);
}

#[test]
fn test_confirmed_item_requires_void_reason() {
    let manager = create_test_manager();
    let session_id = open_session(&manager, "T1");
    let item_id = add_item(
        &manager,
        &session_id,
        Role::Waiter,
        item_input("steak", dec!(25.00), 1),
    );
    confirm(&manager, &session_id);

    let resp = run(
        &manager,
        Role::Waiter,
        SessionCommandPayload::RemoveItem {
            session_id: session_id.clone(),
            item_id: item_id.clone(),
        },
    );
    assert_eq!(error_code(&resp), CommandErrorCode::VoidRequired);
    assert_eq!(
        resp.error.unwrap().suggestion.as_deref(),
        Some("void the item with a reason")
    );

    let resp = run(
        &manager,
        Role::Waiter,
        SessionCommandPayload::VoidItem {
            session_id: session_id.clone(),
            item_id: item_id.clone(),
            reason: "  ".to_string(),
            quantity: None,
        },
    );
    assert_eq!(error_code(&resp), CommandErrorCode::VoidReasonRequired);

    let resp = run(
        &manager,
        Role::Waiter,
        SessionCommandPayload::VoidItem {
            session_id: session_id.clone(),
            item_id: item_id.clone(),
            reason: "wrong table".to_string(),
            quantity: None,
        },
    );
    assert!(resp.success);
    let snapshot = snapshot(&manager, &session_id);
    assert_eq!(snapshot.find_item(&item_id).unwrap().status, ItemStatus::Voided);
}

#[test]
fn test_status_never_moves_backward() {
    let manager = create_test_manager();
    let session_id = open_session(&manager, "T1");
    let item_id = add_item(
        &manager,
        &session_id,
        Role::Waiter,
        item_input("pasta", dec!(12.00), 1),
    );
    confirm(&manager, &session_id);

    // Serving before preparing skips a stage
    let resp = run(
        &manager,
        Role::Kitchen,
        SessionCommandPayload::MarkServed {
            session_id: session_id.clone(),
            item_id: item_id.clone(),
        },
    );
    assert_eq!(error_code(&resp), CommandErrorCode::IllegalTransition);

    let resp = run(
        &manager,
        Role::Kitchen,
        SessionCommandPayload::StartPreparing {
            session_id: session_id.clone(),
            item_ids: None,
        },
    );
    assert!(resp.success);

    // Confirming again finds nothing pending and leaves the line alone
    confirm(&manager, &session_id);
    let line = snapshot(&manager, &session_id);
    assert_eq!(line.find_item(&item_id).unwrap().status, ItemStatus::Preparing);

    let resp = run(
        &manager,
        Role::Kitchen,
        SessionCommandPayload::MarkServed {
            session_id: session_id.clone(),
            item_id: item_id.clone(),
        },
    );
    assert!(resp.success);
    let line = snapshot(&manager, &session_id);
    assert_eq!(line.find_item(&item_id).unwrap().status, ItemStatus::Served);
}

#[test]
fn test_role_rules_enforced() {
    let manager = create_test_manager();
    let session_id = open_session(&manager, "T1");
    add_item(
        &manager,
        &session_id,
        Role::Waiter,
        item_input("tea", dec!(3.00), 1),
    );

    let resp = run(
        &manager,
        Role::Guest,
        SessionCommandPayload::ConfirmPending {
            session_id: session_id.clone(),
        },
    );
    assert_eq!(error_code(&resp), CommandErrorCode::PermissionDenied);

    let resp = run(
        &manager,
        Role::Waiter,
        SessionCommandPayload::StartPreparing {
            session_id: session_id.clone(),
            item_ids: None,
        },
    );
    assert_eq!(error_code(&resp), CommandErrorCode::PermissionDenied);

    let resp = pay_as(&manager, Role::Guest, &session_id, dec!(3.00));
    assert_eq!(error_code(&resp), CommandErrorCode::PermissionDenied);
}

fn pay_as(
    manager: &SessionsManager,
    role: Role,
    session_id: &str,
    amount: Decimal,
) -> CommandResponse {
    run(
        manager,
        role,
        SessionCommandPayload::ProcessPayment {
            session_id: session_id.to_string(),
            payment: PaymentRequest::Single {
                method: PaymentMethod::Pos,
                amount,
            },
        },
    )
}

#[test]
fn test_rejected_command_writes_nothing() {
    let manager = create_test_manager();
    let session_id = open_with_items(&manager, "T1", &[("wine", dec!(30.00), 1)]);
    let sequence = manager.get_current_sequence().unwrap();
    let before = snapshot(&manager, &session_id);

    let resp = pay(&manager, &session_id, dec!(31.00));
    assert_eq!(error_code(&resp), CommandErrorCode::PaymentExceedsRemaining);

    assert_eq!(manager.get_current_sequence().unwrap(), sequence);
    let after = snapshot(&manager, &session_id);
    assert_eq!(after.state_checksum, before.state_checksum);
    assert!(after.transactions.is_empty());
}

#[test]
fn test_events_broadcast_after_commit() {
    let manager = create_test_manager();
    let mut rx = manager.subscribe();

    let session_id = open_session(&manager, "T1");

    let event = rx.try_recv().unwrap();
    assert_eq!(event.session_id, session_id);
    assert_eq!(event.sequence, 1);
    assert!(matches!(event.payload, EventPayload::SessionOpened { .. }));

    // Failures broadcast nothing
    let resp = run(
        &manager,
        Role::Waiter,
        SessionCommandPayload::OpenSession {
            table_id: "T1".to_string(),
        },
    );
    assert!(!resp.success);
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_rebuild_snapshot_matches_stored() {
    let manager = create_test_manager();
    let session_id = open_with_items(
        &manager,
        "T1",
        &[("a", dec!(10.00), 2), ("b", dec!(4.50), 1)],
    );
    confirm(&manager, &session_id);
    let items: Vec<String> = snapshot(&manager, &session_id)
        .items
        .iter()
        .map(|i| i.id.clone())
        .collect();
    let resp = run(
        &manager,
        Role::Waiter,
        SessionCommandPayload::VoidItem {
            session_id: session_id.clone(),
            item_id: items[0].clone(),
            reason: "dropped plate".to_string(),
            quantity: Some(1),
        },
    );
    assert!(resp.success);
    assert!(pay(&manager, &session_id, dec!(5.00)).success);

    let stored = snapshot(&manager, &session_id);
    let rebuilt = manager.rebuild_snapshot(&session_id).unwrap();

    assert_eq!(rebuilt.items, stored.items);
    assert_eq!(rebuilt.bill, stored.bill);
    assert_eq!(rebuilt.transactions, stored.transactions);
    assert_eq!(rebuilt.last_sequence, stored.last_sequence);
    assert_eq!(rebuilt.state_checksum, stored.state_checksum);
    assert_eq!(stored.bill.total_amount, dec!(14.50));
    assert_eq!(stored.bill.remaining(), dec!(9.50));
}

#[test]
fn test_rebuild_unknown_session_fails() {
    let manager = create_test_manager();
    let err = manager.rebuild_snapshot("missing").unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Session(SessionError::SessionNotFound(_))
    ));
}
