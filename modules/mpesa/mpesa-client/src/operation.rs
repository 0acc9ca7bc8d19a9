use std::fmt;
use std::str::FromStr;

use http::Method;
use serde_json::Value;

use crate::error::GatewayError;

/// URL table key of the OAuth token endpoint.
pub const OAUTH_GENERATE_TOKEN: &str = "oauth_generate_token";

/// Remote operations exposed by the M-Pesa API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Transfer from one business to another.
    B2bPaymentRequest,
    /// Transfer from a business to a customer.
    B2cPaymentRequest,
    /// Register C2B confirmation and validation URLs.
    C2bRegisterUrl,
    /// Simulate a customer paying a business (sandbox).
    C2bSimulateTransaction,
    /// Query the status of a transaction.
    TransactionStatusRequest,
    /// Query the balance of a shortcode.
    AccountBalanceRequest,
    /// Reverse a completed transaction.
    ReversalRequest,
    /// Query the state of an STK push request.
    LipaNaMpesaOnlineQuery,
    /// Initiate an STK push payment on behalf of a customer.
    LipaNaMpesaOnlinePayment,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::B2bPaymentRequest,
        Operation::B2cPaymentRequest,
        Operation::C2bRegisterUrl,
        Operation::C2bSimulateTransaction,
        Operation::TransactionStatusRequest,
        Operation::AccountBalanceRequest,
        Operation::ReversalRequest,
        Operation::LipaNaMpesaOnlineQuery,
        Operation::LipaNaMpesaOnlinePayment,
    ];

    /// Key of this operation in the URL table.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Operation::B2bPaymentRequest => "b2b_payment_request",
            Operation::B2cPaymentRequest => "b2c_payment_request",
            Operation::C2bRegisterUrl => "c2b_register_url",
            Operation::C2bSimulateTransaction => "c2b_simulate_transaction",
            Operation::TransactionStatusRequest => "transaction_status_request",
            Operation::AccountBalanceRequest => "account_balance_request",
            Operation::ReversalRequest => "reversal_request",
            Operation::LipaNaMpesaOnlineQuery => "lipa_na_mpesa_online_query",
            Operation::LipaNaMpesaOnlinePayment => "lipa_na_mpesa_online_payment",
        }
    }

    /// Fields the caller must supply, in validation order.
    #[must_use]
    pub const fn required_fields(self) -> &'static [&'static str] {
        match self {
            Operation::B2bPaymentRequest => &[
                "Initiator",
                "SecurityCredential",
                "CommandID",
                "SenderIdentifierType",
                "RecieverIdentifierType",
                "Amount",
                "PartyA",
                "PartyB",
                "AccountReference",
                "Remarks",
                "QueueTimeOutURL",
                "ResultURL",
            ],
            Operation::B2cPaymentRequest => &[
                "InitiatorName",
                "SecurityCredential",
                "CommandID",
                "Amount",
                "PartyA",
                "PartyB",
                "Remarks",
                "QueueTimeOutURL",
                "ResultURL",
                "Occasion",
            ],
            Operation::C2bRegisterUrl => &[
                "ShortCode",
                "ResponseType",
                "ConfirmationURL",
                "ValidationURL",
            ],
            Operation::C2bSimulateTransaction => &["ShortCode", "Amount", "Msisdn"],
            Operation::TransactionStatusRequest => &[
                "Initiator",
                "SecurityCredential",
                "TransactionID",
                "PartyA",
                "ResultURL",
                "QueueTimeOutURL",
                "Remarks",
                "Occasion",
            ],
            Operation::AccountBalanceRequest => &[
                "Initiator",
                "SecurityCredential",
                "PartyA",
                "Remarks",
                "QueueTimeOutURL",
                "ResultURL",
            ],
            Operation::ReversalRequest => &[
                "Initiator",
                "SecurityCredential",
                "TransactionID",
                "Amount",
                "ReceiverParty",
                "ResultURL",
                "QueueTimeOutURL",
                "Remarks",
                "Occasion",
            ],
            Operation::LipaNaMpesaOnlineQuery => &[
                "BusinessShortCode",
                "Password",
                "Timestamp",
                "CheckoutRequestID",
            ],
            Operation::LipaNaMpesaOnlinePayment => &[
                "BusinessShortCode",
                "Password",
                "Amount",
                "PartyA",
                "PartyB",
                "PhoneNumber",
                "CallBackURL",
                "AccountReference",
                "TransactionDesc",
            ],
        }
    }

    /// Fields the client sets itself, overriding anything the caller sent.
    ///
    /// `timestamp` fills the `Timestamp` field of the STK push operations.
    #[must_use]
    pub fn fixed_fields(self, timestamp: &str) -> Vec<(&'static str, Value)> {
        let text = |s: &str| Value::String(s.to_owned());
        match self {
            Operation::B2bPaymentRequest
            | Operation::B2cPaymentRequest
            | Operation::C2bRegisterUrl => Vec::new(),
            Operation::C2bSimulateTransaction => {
                vec![("CommandID", text("CustomerPayBillOnline"))]
            }
            Operation::TransactionStatusRequest => vec![
                ("CommandID", text("TransactionStatusQuery")),
                ("IdentifierType", text("1")),
            ],
            Operation::AccountBalanceRequest => vec![
                ("CommandID", text("AccountBalance")),
                ("IdentifierType", text("4")),
            ],
            Operation::ReversalRequest => vec![
                ("CommandID", text("TransactionReversal")),
                ("ReceiverIdentifierType", text("4")),
            ],
            Operation::LipaNaMpesaOnlineQuery => vec![("Timestamp", text(timestamp))],
            Operation::LipaNaMpesaOnlinePayment => vec![
                ("Timestamp", text(timestamp)),
                ("TransactionType", text("CustomerPayBillOnline")),
            ],
        }
    }

    /// HTTP method used to invoke every operation.
    pub const METHOD: Method = Method::POST;
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Operation {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.key() == s)
            .ok_or_else(|| GatewayError::UnknownOperation(s.to_owned()))
    }
}
