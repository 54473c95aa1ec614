//! Names of the vendor API operations.
//!
//! Only the list operations have typed wrappers on `Client`; the rest are
//! reachable through `Client::call` with a raw parameter map.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GetLists,
    CreateList,
    UpdateList,
    DeleteList,
    Exclude,
    Unsubscribe,
    ImportContacts,
    GetTotalContactsCount,
    GetContactCount,
    IsContactInLists,
    GetContactFieldValues,
    CreateEmailMessage,
    CreateSmsMessage,
    CreateCampaign,
    GetActualMessageVersion,
    CheckSms,
    SendSms,
    SendEmail,
    SendTestEmail,
    CheckEmail,
    UpdateOptInEmail,
    GetWebVersion,
    DeleteMessage,
    CreateEmailTemplate,
    UpdateEmailTemplate,
    DeleteTemplate,
    GetTemplate,
    GetTemplates,
    ListTemplates,
    GetCampaignCommonStats,
    GetVisitedLinks,
    GetCampaigns,
    GetCampaignStatus,
    GetMessages,
    GetMessage,
    ListMessages,
    GetFields,
    CreateField,
    UpdateField,
    DeleteField,
    GetTags,
    DeleteTag,
}

impl Method {
    /// The method name as it appears in the request path.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::GetLists => "getLists",
            Method::CreateList => "createList",
            Method::UpdateList => "updateList",
            Method::DeleteList => "deleteList",
            Method::Exclude => "exclude",
            Method::Unsubscribe => "unsubscribe",
            Method::ImportContacts => "importContacts",
            Method::GetTotalContactsCount => "getTotalContactsCount",
            Method::GetContactCount => "getContactCount",
            Method::IsContactInLists => "isContactInLists",
            Method::GetContactFieldValues => "getContactFieldValues",
            Method::CreateEmailMessage => "createEmailMessage",
            Method::CreateSmsMessage => "createSmsMessage",
            Method::CreateCampaign => "createCampaign",
            Method::GetActualMessageVersion => "getActualMessageVersion",
            Method::CheckSms => "checkSms",
            Method::SendSms => "sendSms",
            Method::SendEmail => "sendEmail",
            Method::SendTestEmail => "sendTestEmail",
            Method::CheckEmail => "checkEmail",
            Method::UpdateOptInEmail => "updateOptInEmail",
            Method::GetWebVersion => "getWebVersion",
            Method::DeleteMessage => "deleteMessage",
            Method::CreateEmailTemplate => "createEmailTemplate",
            Method::UpdateEmailTemplate => "updateEmailTemplate",
            Method::DeleteTemplate => "deleteTemplate",
            Method::GetTemplate => "getTemplate",
            Method::GetTemplates => "getTemplates",
            Method::ListTemplates => "listTemplates",
            Method::GetCampaignCommonStats => "getCampaignCommonStats",
            Method::GetVisitedLinks => "getVisitedLinks",
            Method::GetCampaigns => "getCampaigns",
            Method::GetCampaignStatus => "getCampaignStatus",
            Method::GetMessages => "getMessages",
            Method::GetMessage => "getMessage",
            Method::ListMessages => "listMessages",
            Method::GetFields => "getFields",
            Method::CreateField => "createField",
            Method::UpdateField => "updateField",
            Method::DeleteField => "deleteField",
            Method::GetTags => "getTags",
            Method::DeleteTag => "deleteTag",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
